//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod helpline_list;
pub mod say;
pub mod tag_list;

use std::error::Error;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::auth::AuthManager;
use crate::cli::helpline_list::list_helplines;
use crate::cli::say::run_say;
use crate::cli::tag_list::list_tags;
use crate::core::app::AppOptions;
use crate::core::config::Config;
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::{init_tracing, LogTarget};

#[derive(Parser, Debug)]
#[command(name = "act-companion")]
#[command(version)]
#[command(about = "A terminal companion for Acceptance and Commitment Therapy practice")]
#[command(
    long_about = "ACT Companion is a full-screen terminal chat that streams replies from a \
Gemini model steered by behavior tags (empathy, mindfulness, emotion regulation, values \
clarification). Without an API key it runs in demo mode and simulates replies.\n\n\
Authentication:\n\
  Use 'act-companion auth' to store a Gemini API key in your system keyring.\n\n\
Environment Variables (take precedence over the keyring):\n\
  GEMINI_API_KEY    Your Gemini API key\n\
  API_KEY           Fallback variable for the same key\n\
  RUST_LOG          Diagnostic log filter\n\n\
Controls:\n\
  Enter             Send the message (or toggle the selected tag)\n\
  Tab               Switch focus between the input and the tag list\n\
  Up/Down           Move through the tag list\n\
  Space             Toggle the selected tag\n\
  F1                Show helplines\n\
  F5                Reload the API key (after 'act-companion auth')\n\
  Esc               Close the helpline dialog\n\
  Ctrl+C            Quit the application\n\n\
If you are in crisis, run 'act-companion helplines' for support resources."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Behavior tag to enable at startup; repeat to enable several (replaces the default tags)
    #[arg(short = 't', long = "tag", global = true, value_name = "TAG")]
    pub tags: Vec<String>,

    /// Simulate replies instead of contacting the model
    #[arg(long, global = true)]
    pub demo: bool,

    /// Sign in with Google and append the conversation to the configured document
    #[arg(long, global = true)]
    pub log_doc: bool,

    /// Increase diagnostic output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write diagnostics to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub trace_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send one message and stream the reply to stdout
    Say {
        /// Message to send
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// List behavior tags
    Tags,
    /// List crisis helplines
    Helplines,
    /// Store a Gemini API key in the system keyring
    Auth,
    /// Remove the stored Gemini API key
    Deauth {
        /// Do not ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Set configuration values, or print them when no key is given
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key (can be multiple words)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

impl Args {
    fn app_options(&self) -> AppOptions {
        AppOptions {
            tags: self.tags.clone(),
            force_demo: self.demo,
            log_to_document: self.log_doc,
        }
    }

    /// The full-screen UI owns stderr, so it only logs to a file.
    fn log_target(&self, command: &Commands) -> LogTarget {
        match (&self.trace_file, command) {
            (Some(path), _) => LogTarget::File(path.clone()),
            (None, Commands::Chat) => LogTarget::Disabled,
            (None, _) => LogTarget::Stderr,
        }
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let command = args.command.clone().unwrap_or(Commands::Chat);
    init_tracing(args.verbose, args.log_target(&command))?;

    match command {
        Commands::Chat => run_chat(args.app_options()).await,
        Commands::Say { prompt } => run_say(prompt, args.app_options()).await,
        Commands::Tags => list_tags(),
        Commands::Helplines => {
            list_helplines();
            Ok(())
        }
        Commands::Auth => {
            let auth_manager = AuthManager::new();
            if let Err(e) = auth_manager.interactive_auth() {
                eprintln!("❌ Authentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Deauth { yes } => {
            let auth_manager = AuthManager::new();
            if let Err(e) = auth_manager.interactive_deauth(yes) {
                eprintln!("❌ Deauthentication failed: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            let Some(key) = key else {
                config.print_all();
                return Ok(());
            };
            if value.is_empty() {
                config.print_all();
                return Ok(());
            }
            let value = value.join(" ");
            if let Err(e) = config.set_value(&key, &value) {
                eprintln!("❌ {e}");
                std::process::exit(1);
            }
            config.save()?;
            println!("✅ Set {key} to: {value}");
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            if let Err(e) = config.unset_value(&key) {
                eprintln!("❌ {e}");
                std::process::exit(1);
            }
            config.save()?;
            println!("✅ Unset {key}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).expect("arguments parse")
    }

    #[test]
    fn no_subcommand_means_chat() {
        let args = parse(&["act-companion"]);
        assert!(args.command.is_none());
        assert_eq!(args.log_target(&Commands::Chat), LogTarget::Disabled);
    }

    #[test]
    fn global_flags_shape_app_options() {
        let args = parse(&[
            "act-companion",
            "--tag",
            "empathy",
            "-t",
            "values_clarification",
            "--demo",
            "-vv",
        ]);
        assert_eq!(
            args.app_options(),
            AppOptions {
                tags: vec!["empathy".to_string(), "values_clarification".to_string()],
                force_demo: true,
                log_to_document: false,
            }
        );
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn say_collects_prompt_words() {
        let args = parse(&["act-companion", "say", "I", "feel", "anxious"]);
        assert_eq!(
            args.command,
            Some(Commands::Say {
                prompt: vec!["I".to_string(), "feel".to_string(), "anxious".to_string()]
            })
        );
        let command = args.command.clone().expect("command");
        assert_eq!(args.log_target(&command), LogTarget::Stderr);
    }

    #[test]
    fn trace_file_wins_for_every_command() {
        let args = parse(&["act-companion", "--trace-file", "/tmp/act.log", "tags"]);
        assert_eq!(
            args.log_target(&Commands::Chat),
            LogTarget::File(PathBuf::from("/tmp/act.log"))
        );
    }

    #[test]
    fn set_accepts_multi_word_values() {
        let args = parse(&["act-companion", "set", "default-tags", "empathy", "mindfulness"]);
        assert_eq!(
            args.command,
            Some(Commands::Set {
                key: Some("default-tags".to_string()),
                value: vec!["empathy".to_string(), "mindfulness".to_string()],
            })
        );
    }

    #[test]
    fn log_doc_flag_is_global() {
        let args = parse(&["act-companion", "say", "--log-doc", "hello"]);
        assert!(args.app_options().log_to_document);
    }
}
