//! Presentation-only state for the chat screen: the input box, which pane
//! has focus, the tag cursor and transcript scrolling.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders};
use tui_textarea::TextArea;

use crate::core::tags::{BehaviorTag, BEHAVIOR_TAGS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Tags,
}

pub struct ChatView<'a> {
    pub textarea: TextArea<'a>,
    pub focus: Focus,
    pub tag_cursor: usize,
    /// Lines scrolled up from the bottom of the transcript.
    pub scroll_back: u16,
}

fn new_textarea<'a>() -> TextArea<'a> {
    let mut textarea = TextArea::default();
    textarea.set_cursor_line_style(Style::default());
    textarea.set_placeholder_text("Share what is on your mind…");
    textarea.set_placeholder_style(Style::default().fg(Color::DarkGray));
    textarea
}

impl<'a> ChatView<'a> {
    pub fn new() -> Self {
        Self {
            textarea: new_textarea(),
            focus: Focus::Input,
            tag_cursor: 0,
            scroll_back: 0,
        }
    }

    pub fn input_text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn clear_input(&mut self) {
        self.textarea = new_textarea();
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::Tags,
            Focus::Tags => Focus::Input,
        };
    }

    pub fn move_tag_cursor(&mut self, delta: isize) {
        let last = BEHAVIOR_TAGS.len().saturating_sub(1);
        self.tag_cursor = self.tag_cursor.saturating_add_signed(delta).min(last);
    }

    pub fn selected_tag(&self) -> Option<&'static BehaviorTag> {
        BEHAVIOR_TAGS.get(self.tag_cursor)
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_back = self.scroll_back.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
    }

    /// Height of the input box contents, one to five rows.
    pub fn input_height(&self) -> u16 {
        self.textarea.lines().len().clamp(1, 5) as u16
    }

    pub fn input_block(&self, title: &'a str) -> Block<'a> {
        let border = match self.focus {
            Focus::Input => Style::default().fg(Color::Cyan),
            Focus::Tags => Style::default(),
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(title)
    }

    pub fn set_input_block(&mut self, title: &'a str, dimmed: bool) {
        let block = self.input_block(title);
        self.textarea.set_block(block);
        let style = if dimmed {
            Style::default().add_modifier(Modifier::DIM)
        } else {
            Style::default()
        };
        self.textarea.set_style(style);
    }
}

impl Default for ChatView<'_> {
    fn default() -> Self {
        Self::new()
    }
}
