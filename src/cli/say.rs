//! TUI-less "say" command

use std::error::Error;
use std::io::{self, Write};

use crate::core::app::{apply_action, build_app, shutdown, AppAction, AppOptions};
use crate::core::assembler::{TurnState, STREAM_FAILURE_MESSAGE};
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::core::config::data::Config;
use crate::core::safety::{HELPLINES, HELPLINE_HEADING};

pub async fn run_say(prompt: Vec<String>, options: AppOptions) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: act-companion say <prompt>");
        std::process::exit(1);
    }

    let config = Config::load()?;
    let mut app = build_app(&options, &config).await?;
    if app.mode.is_demo() {
        eprintln!("ℹ️  Demo mode: no API key is configured, so the reply is simulated.");
    }

    let (stream_service, mut rx) = ChatStreamService::new();
    let commands = apply_action(&mut app, AppAction::SubmitMessage { message: prompt });
    if app.helpline_visible {
        eprintln!("{HELPLINE_HEADING}");
        for helpline in HELPLINES {
            eprintln!("  • {}: {} ({})", helpline.name, helpline.phone, helpline.website);
        }
        eprintln!();
    }
    app.run_commands(&stream_service, commands);

    let mut failure = None;
    while app.is_loading() {
        let Some((message, stream_id)) = rx.recv().await else {
            break;
        };
        if app.is_current_stream(stream_id) {
            match &message {
                StreamMessage::Chunk(content) => {
                    print!("{content}");
                    io::stdout().flush()?;
                }
                StreamMessage::Error(err) => failure = Some(err.to_string()),
                StreamMessage::End => println!(),
            }
        }
        let commands = apply_action(&mut app, AppAction::from_stream_message(message, stream_id));
        app.run_commands(&stream_service, commands);
    }

    let failed = app.assembler.state() == Some(TurnState::Failed);
    shutdown(&mut app, &config).await;

    if failed {
        let detail = failure.unwrap_or_else(|| STREAM_FAILURE_MESSAGE.to_string());
        eprintln!("\n❌ Error: {detail}");
        std::process::exit(1);
    }
    Ok(())
}
