//! Terminal presentation of reports, advice and messages.

use std::fmt::Write;

use farmcast_core::{
    Advice, DailySummary, FloodRisk, HourlyReading, Level, Outlook, Report, View, VoiceReply,
};

const BAR_WIDTH: usize = 24;

pub fn print_view(view: &View) {
    match view {
        View::Dashboard { report, advice } => {
            print_report(report);
            println!();
            print!("{}", advice_block(advice));
        }
        View::Answer { question, advice } => {
            println!("Q: {question}");
            print!("{}", advice_block(advice));
        }
        View::Voice(VoiceReply { transcript, advice }) => {
            println!("Transcribed: {transcript}");
            print!("{}", advice_block(advice));
        }
        View::Message { level: Level::Info, text } => println!("{text}"),
        View::Message { level: Level::Error, text } => eprintln!("Error: {text}"),
    }
}

pub fn print_report(report: &Report) {
    println!(
        "Forecast for {} (via {})\n",
        report.forecast.location, report.forecast.provider
    );
    print!("{}", reading_chart(&report.forecast.readings));
    println!();
    print!("{}", summary_table(&report.summary));
    println!();
    println!("{}", outlook_line(&report.outlook));
}

pub fn badge(risk: FloodRisk) -> String {
    let dot = match risk.color() {
        "green" => "🟢",
        "yellow" => "🟡",
        _ => "🔴",
    };
    format!("{dot} {}", risk.as_str().to_uppercase())
}

/// Rain as bars scaled to the wettest reading, temperature alongside.
pub fn reading_chart(readings: &[HourlyReading]) -> String {
    let max_rain = readings.iter().map(|r| r.rainfall_mm).fold(0.0_f64, f64::max);
    let mut out = String::from("Rain & temperature\n");

    for r in readings {
        let filled = if max_rain > 0.0 {
            ((r.rainfall_mm.max(0.0) / max_rain) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        let _ = writeln!(
            out,
            "{} │{:<width$}│ {:>5.1} mm │ {:>5.1} °C │ {}",
            r.timestamp.format("%a %d %H:%M"),
            "█".repeat(filled),
            r.rainfall_mm,
            r.temperature_c,
            r.condition,
            width = BAR_WIDTH,
        );
    }
    out
}

pub fn summary_table(days: &[DailySummary]) -> String {
    let mut out = format!(
        "{:<10}  {:>7}  {:>6}  {:>6}  {:>6}  {:>9}  {:>6}  {}\n",
        "Date", "Rain mm", "Min °C", "Max °C", "Avg °C", "Wind km/h", "Hum %", "Flood risk"
    );
    for d in days {
        let _ = writeln!(
            out,
            "{:<10}  {:>7.1}  {:>6.1}  {:>6.1}  {:>6.1}  {:>9.1}  {:>6.0}  {}",
            d.date,
            d.rainfall_total_mm,
            d.temp_min_c,
            d.temp_max_c,
            d.temp_mean_c,
            d.wind_max_kmh,
            d.humidity_mean_pct,
            badge(d.flood_risk),
        );
    }
    out
}

pub fn outlook_line(outlook: &Outlook) -> String {
    format!(
        "Today's rain: {:.1} mm · Avg temperature: {:.1} °C · Avg humidity: {:.0}% · Flood risk: {}",
        outlook.today_rain_mm,
        outlook.mean_temp_c,
        outlook.mean_humidity_pct,
        badge(outlook.peak_risk),
    )
}

pub fn advice_block(advice: &Advice) -> String {
    let title = if advice.fallback { "Advice (offline guidance)" } else { "Advice" };
    format!("{title}:\n{}\n", advice.text)
}
