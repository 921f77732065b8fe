//! Interactive session: each line becomes one dashboard event.

use std::path::PathBuf;

use farmcast_core::{
    Crop, Dashboard, DashboardError, Event, Language, Session, View, audio::AudioClip,
};
use inquire::{InquireError, Text};

use crate::{
    cli::{parse_crop, speak_to_file},
    render,
};

const DEFAULT_SPEECH_FILE: &str = "farmcast-advice.mp3";

const HELP: &str = "\
Type a question, or one of:
  /city <name>      switch city and refresh
  /lang <language>  english, hindi or gujarati
  /crop <crop>      wheat, rice, maize or none
  /voice <file>     ask from an audio recording
  /refresh          reload the forecast
  /radar            radar link for the current city
  /speak [file]     save the last advice as spoken MP3
  /clear            forget the chat history
  /help             show this help
  /quit             leave";

#[derive(Debug)]
enum ChatCommand {
    Event(Event),
    Voice(PathBuf),
    Speak(PathBuf),
    Radar,
    Help,
    Quit,
    Nothing,
}

fn parse_line(line: &str) -> Result<ChatCommand, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ChatCommand::Nothing);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(ChatCommand::Event(Event::Ask(line.to_string())));
    };

    let (cmd, arg) = match rest.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (rest, ""),
    };
    let need = |usage: &str| {
        if arg.is_empty() { Err(format!("Usage: {usage}")) } else { Ok(arg) }
    };

    match cmd.to_lowercase().as_str() {
        "city" => Ok(ChatCommand::Event(Event::SetCity(need("/city <name>")?.to_string()))),
        "lang" | "language" => {
            let language: Language = need("/lang <language>")?.parse().map_err(|e| format!("{e}"))?;
            Ok(ChatCommand::Event(Event::SetLanguage(language)))
        }
        "crop" => {
            let crop: Option<Crop> = parse_crop(need("/crop <crop>")?).map_err(|e| format!("{e}"))?;
            Ok(ChatCommand::Event(Event::SetCrop(crop)))
        }
        "voice" => Ok(ChatCommand::Voice(PathBuf::from(need("/voice <file>")?))),
        "refresh" => Ok(ChatCommand::Event(Event::Refresh)),
        "clear" => Ok(ChatCommand::Event(Event::ClearHistory)),
        "speak" | "say" => {
            let file = if arg.is_empty() { DEFAULT_SPEECH_FILE } else { arg };
            Ok(ChatCommand::Speak(PathBuf::from(file)))
        }
        "radar" => Ok(ChatCommand::Radar),
        "help" | "?" => Ok(ChatCommand::Help),
        "quit" | "exit" | "q" => Ok(ChatCommand::Quit),
        other => Err(format!("Unknown command '/{other}'. Type /help for the list.")),
    }
}

pub async fn run(dashboard: &Dashboard, mut session: Session) -> anyhow::Result<()> {
    println!("{HELP}\n");

    let mut last_advice = None;

    if !session.city.trim().is_empty() {
        let view = dashboard.handle(&mut session, Event::Refresh).await;
        show(&view, &mut last_advice);
    }

    loop {
        let prompt = if session.city.is_empty() {
            "farmcast>".to_string()
        } else {
            format!("farmcast [{}]>", session.city)
        };

        let line = match Text::new(&prompt).prompt() {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(usage) => {
                eprintln!("{usage}");
                continue;
            }
        };

        match command {
            ChatCommand::Nothing => {}
            ChatCommand::Quit => break,
            ChatCommand::Help => println!("{HELP}"),
            ChatCommand::Event(event) => {
                let view = dashboard.handle(&mut session, event).await;
                show(&view, &mut last_advice);
            }
            ChatCommand::Voice(path) => match AudioClip::from_path(&path).await {
                Ok(clip) => {
                    let view = dashboard.handle(&mut session, Event::Voice(clip)).await;
                    show(&view, &mut last_advice);
                }
                Err(e) => eprintln!("Error: {}", DashboardError::from(e).user_message()),
            },
            ChatCommand::Speak(path) => match last_advice.as_deref() {
                Some(text) => match speak_to_file(dashboard, text, &path).await {
                    Ok(()) => println!("Saved spoken advice to {}", path.display()),
                    Err(e) => eprintln!("Error: {e}"),
                },
                None => eprintln!("Nothing to speak yet. Ask a question or /refresh first."),
            },
            ChatCommand::Radar => match dashboard.report(&session).await {
                Ok(report) => println!("{}", dashboard.radar(&report).url()),
                Err(e) => eprintln!("Error: {}", e.user_message()),
            },
        }
        println!();
    }

    Ok(())
}

/// Print a view and keep its advice for `/speak`.
fn show(view: &View, last_advice: &mut Option<String>) {
    if let Some(advice) = view.advice() {
        *last_advice = Some(advice.text.clone());
    }
    render::print_view(view);
}
