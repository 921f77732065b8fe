use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use farmcast_core::{
    Config, Crop, Dashboard, Event, Level, ProviderId, Session, View, audio::AudioClip,
    radar::RadarEmbed,
};

use tracing::debug;

use crate::{chat, configure, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "farmcast", version, about = "Weather dashboard and farming advisor")]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv). `RUST_LOG` overrides it.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command that talks to a weather provider.
#[derive(Debug, Args)]
pub struct SessionOpts {
    /// Weather provider to use instead of the configured default.
    #[arg(long)]
    pub provider: Option<String>,

    /// Crop to tailor advice for: wheat, rice, maize or none.
    #[arg(long)]
    pub crop: Option<String>,

    /// Answer language: english, hindi or gujarati.
    #[arg(long)]
    pub language: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a weather provider or the advisory assistant.
    Configure {
        /// "openweather", "weatherapi" or "assistant".
        target: String,
    },

    /// Show the forecast dashboard for a city.
    Show {
        /// City name; defaults to the configured default city.
        city: Option<String>,

        #[command(flatten)]
        opts: SessionOpts,

        /// Skip the farming advice.
        #[arg(long)]
        no_advice: bool,

        /// Write the spoken advice to this MP3 file.
        #[arg(long, value_name = "OUT.mp3", conflicts_with = "no_advice")]
        speak: Option<PathBuf>,
    },

    /// Ask a farming question about a city's forecast.
    Ask {
        question: String,

        #[arg(short, long)]
        city: Option<String>,

        #[command(flatten)]
        opts: SessionOpts,

        /// Write the spoken answer to this MP3 file.
        #[arg(long, value_name = "OUT.mp3")]
        speak: Option<PathBuf>,
    },

    /// Ask a question from an audio recording (wav, mp3, m4a or ogg).
    Voice {
        audio: PathBuf,

        #[arg(short, long)]
        city: Option<String>,

        #[command(flatten)]
        opts: SessionOpts,

        /// Write the spoken answer to this MP3 file.
        #[arg(long, value_name = "OUT.mp3")]
        speak: Option<PathBuf>,
    },

    /// Print the precipitation radar link for a city.
    Radar {
        city: Option<String>,

        /// Print an HTML iframe instead of the bare URL.
        #[arg(long)]
        html: bool,

        #[command(flatten)]
        opts: SessionOpts,
    },

    /// Start an interactive session.
    Chat {
        city: Option<String>,

        #[command(flatten)]
        opts: SessionOpts,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { target } => configure::run(&target),

            Command::Show { city, opts, no_advice, speak } => {
                let (dashboard, mut session) = open(city, &opts)?;
                if no_advice {
                    let report =
                        dashboard.report(&session).await.map_err(|e| anyhow!(e.user_message()))?;
                    render::print_report(&report);
                    Ok(())
                } else {
                    let view = dashboard.handle(&mut session, Event::Refresh).await;
                    deliver(&dashboard, view, speak.as_deref()).await
                }
            }

            Command::Ask { question, city, opts, speak } => {
                let (dashboard, mut session) = open(city, &opts)?;
                let view = dashboard.handle(&mut session, Event::Ask(question)).await;
                deliver(&dashboard, view, speak.as_deref()).await
            }

            Command::Voice { audio, city, opts, speak } => {
                let (dashboard, mut session) = open(city, &opts)?;
                let clip = AudioClip::from_path(&audio)
                    .await
                    .map_err(|e| anyhow!(farmcast_core::DashboardError::from(e).user_message()))?;

                let view = dashboard.handle(&mut session, Event::Voice(clip)).await;
                deliver(&dashboard, view, speak.as_deref()).await
            }

            Command::Radar { city, html, opts } => {
                let config = Config::load()?;
                let city = city.or(config.dashboard.default_city.clone()).unwrap_or_default();

                let radar = if city.trim().is_empty() {
                    RadarEmbed::new(None)
                } else {
                    let (dashboard, session) = open(Some(city), &opts)?;
                    let report =
                        dashboard.report(&session).await.map_err(|e| anyhow!(e.user_message()))?;
                    dashboard.radar(&report)
                };

                if html {
                    println!("{}", radar.iframe_html(800, 450));
                } else {
                    println!("{}", radar.url());
                }
                Ok(())
            }

            Command::Chat { city, opts } => {
                let (dashboard, session) = open(city, &opts)?;
                chat::run(&dashboard, session).await
            }
        }
    }
}

/// Build the dashboard and a session from config plus command-line overrides.
fn open(city: Option<String>, opts: &SessionOpts) -> anyhow::Result<(Dashboard, Session)> {
    let config = Config::load()?;

    let provider = opts.provider.as_deref().map(ProviderId::try_from).transpose()?;
    let dashboard = Dashboard::from_config(&config, provider)?;

    let mut session = Session::from_config(&config);
    if let Some(city) = city {
        session.city = city;
    }
    if let Some(crop) = &opts.crop {
        session.crop = parse_crop(crop)?;
    }
    if let Some(language) = &opts.language {
        session.language = language.parse()?;
    }

    debug!(city = %session.city, ?provider, language = %session.language, "Opened dashboard session");
    Ok((dashboard, session))
}

pub(crate) fn parse_crop(value: &str) -> anyhow::Result<Option<Crop>> {
    if value.trim().eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    Ok(Some(value.parse()?))
}

/// Print a one-shot view; error messages become the process error.
fn finish(view: View) -> anyhow::Result<()> {
    match view {
        View::Message { level: Level::Error, text } => Err(anyhow!(text)),
        other => {
            render::print_view(&other);
            Ok(())
        }
    }
}

/// Print the view, then speak its advice into `speak` when asked to.
async fn deliver(dashboard: &Dashboard, view: View, speak: Option<&Path>) -> anyhow::Result<()> {
    let advice = view.advice().map(|advice| advice.text.clone());
    finish(view)?;

    if let (Some(path), Some(advice)) = (speak, advice) {
        speak_to_file(dashboard, &advice, path).await?;
        println!("Saved spoken advice to {}", path.display());
    }
    Ok(())
}

/// Synthesize `text` and write the MP3 bytes to `path`.
pub(crate) async fn speak_to_file(
    dashboard: &Dashboard,
    text: &str,
    path: &Path,
) -> anyhow::Result<()> {
    let clip = dashboard.speak(text).await.map_err(|e| anyhow!(e.user_message()))?;
    std::fs::write(path, clip.into_data())
        .with_context(|| format!("Failed to write audio to {}", path.display()))
}
