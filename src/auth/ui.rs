//! Masked single-line prompt for entering the API key.

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::fmt;
use std::io::{self, Write};
use std::time::Duration;

const MASKED_INPUT_PROMPT: &str = "Enter your Gemini API key (press F2 to reveal last 4 chars): ";
const REVEALED_TAIL_CHARS: usize = 4;

#[derive(Debug, Clone)]
pub struct UiError {
    message: String,
}

impl UiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for UiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UiError {}

impl From<io::Error> for UiError {
    fn from(err: io::Error) -> Self {
        Self::new(err.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaskedInput {
    pub text: String,
    pub reveal_tail: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaskedOutcome {
    Continue,
    Submit(String),
    Cancelled,
}

impl MaskedInput {
    pub fn apply_key(&mut self, key: &KeyEvent) -> MaskedOutcome {
        match key.code {
            KeyCode::Enter => MaskedOutcome::Submit(self.text.trim().to_string()),
            KeyCode::Esc => MaskedOutcome::Cancelled,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                MaskedOutcome::Cancelled
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.text.clear();
                MaskedOutcome::Continue
            }
            KeyCode::Backspace => {
                self.text.pop();
                MaskedOutcome::Continue
            }
            KeyCode::F(2) => {
                self.reveal_tail = !self.reveal_tail;
                MaskedOutcome::Continue
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.text.push(c);
                MaskedOutcome::Continue
            }
            _ => MaskedOutcome::Continue,
        }
    }

    /// Pasted text is taken up to its first line break.
    pub fn paste(&mut self, pasted: &str) {
        let line = pasted.lines().next().unwrap_or_default();
        self.text.extend(line.chars().filter(|c| !c.is_control()));
    }

    /// Every character masked, except the last few when revealed.
    pub fn display(&self) -> String {
        let count = self.text.chars().count();
        let shown = if self.reveal_tail {
            REVEALED_TAIL_CHARS.min(count)
        } else {
            0
        };
        let mut masked = "•".repeat(count - shown);
        masked.extend(self.text.chars().skip(count - shown));
        masked
    }
}

pub fn prompt_masked_input() -> Result<String, UiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, event::EnableBracketedPaste)?;

    let result = read_masked(&mut stdout);

    let restore_raw = disable_raw_mode();
    let restore_paste = execute!(stdout, event::DisableBracketedPaste);
    println!();

    let value = result?;
    restore_raw?;
    restore_paste?;
    Ok(value)
}

fn read_masked(stdout: &mut io::Stdout) -> Result<String, UiError> {
    let mut input = MaskedInput::default();
    redraw(stdout, &input)?;
    loop {
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match input.apply_key(&key) {
                MaskedOutcome::Continue => redraw(stdout, &input)?,
                MaskedOutcome::Submit(value) => return Ok(value),
                MaskedOutcome::Cancelled => return Err(UiError::new("Cancelled by user")),
            },
            Event::Paste(text) => {
                input.paste(&text);
                redraw(stdout, &input)?;
            }
            _ => {}
        }
    }
}

fn redraw(stdout: &mut io::Stdout, input: &MaskedInput) -> io::Result<()> {
    write!(stdout, "\r\x1b[K{}{}", MASKED_INPUT_PROMPT, input.display())?;
    stdout.flush()
}

pub fn prompt_confirmation(question: &str) -> Result<bool, UiError> {
    print!("{question} (y/N): ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(parse_confirmation(&answer))
}

pub fn parse_confirmation(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
