use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::app::App;
use crate::core::message::{Role, Turn};
use crate::core::mode::OperatingMode;
use crate::core::safety::{HELPLINES, HELPLINE_HEADING, HELPLINE_INTRO};
use crate::core::tags::{TagSelection, BEHAVIOR_TAGS};
use crate::ui::view::{ChatView, Focus};

const SIDEBAR_WIDTH: u16 = 32;
const USER_COLOR: Color = Color::Cyan;
const COMPANION_COLOR: Color = Color::Green;

const INPUT_TITLE: &str = "Message (Enter send • Alt+Enter newline • Tab tags • F1 help • Ctrl+C quit)";
const INPUT_TITLE_BUSY: &str = "Companion is replying… (Ctrl+C quit)";

pub fn ui(f: &mut Frame, app: &App, view: &mut ChatView<'_>) {
    let area = f.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(view.input_height() + 2),
        ])
        .split(area);

    f.render_widget(Paragraph::new(header_line(app)), rows[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(SIDEBAR_WIDTH)])
        .split(rows[1]);
    render_transcript(f, app, view, body[0]);
    render_tag_sidebar(f, &app.session_config.tags, view, body[1]);

    f.render_widget(Paragraph::new(status_line(app)), rows[2]);

    if app.is_loading() {
        view.set_input_block(INPUT_TITLE_BUSY, true);
    } else {
        view.set_input_block(INPUT_TITLE, false);
    }
    f.render_widget(&view.textarea, rows[3]);

    if app.helpline_visible {
        render_helpline_modal(f, area);
    }
}

fn header_line(app: &App) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            format!("ACT Companion v{}", env!("CARGO_PKG_VERSION")),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" • {} • ", app.session_config.model)),
    ];
    match app.mode {
        OperatingMode::Live => spans.push(Span::styled("LIVE", Style::default().fg(Color::Green))),
        OperatingMode::Demo => spans.push(Span::styled(
            "DEMO: replies are simulated",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
    }
    if app.transcript.is_some() {
        spans.push(Span::raw(" • Logging to document"));
    }
    Line::from(spans)
}

fn status_line(app: &App) -> Line<'static> {
    match &app.status {
        Some(status) => Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(Span::styled(
            "Press F1 at any time for crisis helplines.",
            Style::default().fg(Color::DarkGray),
        )),
    }
}

/// Speaker label followed by the turn's lines and a blank separator.
pub fn transcript_lines(turns: &[Turn]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for turn in turns {
        let (label, color) = match turn.role {
            Role::User => ("You", USER_COLOR),
            Role::Model => ("Companion", COMPANION_COLOR),
        };
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        if turn.is_pending() {
            lines.push(Line::from(Span::styled(
                "…",
                Style::default().add_modifier(Modifier::DIM),
            )));
        } else {
            lines.extend(turn.content.lines().map(|line| Line::from(line.to_string())));
        }
        lines.push(Line::default());
    }
    lines
}

/// Splits text into alternating runs of whitespace and non-whitespace.
fn split_runs(text: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut in_space = None;
    for (index, ch) in text.char_indices() {
        let space = ch.is_whitespace();
        if in_space.is_some_and(|previous| previous != space) {
            runs.push(&text[start..index]);
            start = index;
        }
        in_space = Some(space);
    }
    if start < text.len() {
        runs.push(&text[start..]);
    }
    runs
}

fn push_text(row: &mut Vec<Span<'static>>, text: &str, style: Style) {
    match row.last_mut() {
        Some(last) if last.style == style => last.content.to_mut().push_str(text),
        _ => row.push(Span::styled(text.to_string(), style)),
    }
}

/// Greedy word wrap to `width` columns. Words wider than a row are split
/// across rows; whitespace at a break is dropped.
pub fn wrap_line(line: &Line<'_>, width: u16) -> Vec<Line<'static>> {
    let width = usize::from(width.max(1));
    let mut rows: Vec<Vec<Span<'static>>> = vec![Vec::new()];
    let mut used = 0;

    for span in &line.spans {
        for run in split_runs(&span.content) {
            let run_width = UnicodeWidthStr::width(run);
            let row = rows.len() - 1;
            if used + run_width <= width {
                push_text(&mut rows[row], run, span.style);
                used += run_width;
            } else if run.starts_with(char::is_whitespace) {
                if used > 0 {
                    rows.push(Vec::new());
                    used = 0;
                }
            } else if used > 0 && run_width <= width {
                rows.push(Vec::new());
                push_text(&mut rows[row + 1], run, span.style);
                used = run_width;
            } else {
                for ch in run.chars() {
                    let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
                    if used > 0 && used + ch_width > width {
                        rows.push(Vec::new());
                        used = 0;
                    }
                    let last = rows.len() - 1;
                    push_text(&mut rows[last], ch.encode_utf8(&mut [0; 4]), span.style);
                    used += ch_width;
                }
            }
        }
    }

    rows.into_iter()
        .map(|spans| Line::from(spans).style(line.style))
        .collect()
}

pub fn wrap_lines(lines: &[Line<'_>], width: u16) -> Vec<Line<'static>> {
    lines.iter().flat_map(|line| wrap_line(line, width)).collect()
}

fn render_transcript(f: &mut Frame, app: &App, view: &mut ChatView<'_>, area: Rect) {
    let turns = app.conversation.snapshot();
    let lines = transcript_lines(&turns);

    let block = Block::default().borders(Borders::RIGHT);
    let rows = wrap_lines(&lines, area.width.saturating_sub(1));
    let total = u16::try_from(rows.len()).unwrap_or(u16::MAX);
    let max_offset = total.saturating_sub(area.height);
    view.scroll_back = view.scroll_back.min(max_offset);
    let offset = max_offset - view.scroll_back;

    let paragraph = Paragraph::new(rows).block(block).scroll((offset, 0));
    f.render_widget(paragraph, area);
}

fn render_tag_sidebar(f: &mut Frame, tags: &TagSelection, view: &ChatView<'_>, area: Rect) {
    let focused = view.focus == Focus::Tags;
    let description_height = 6;
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(description_height)])
        .split(area);

    let items: Vec<ListItem> = BEHAVIOR_TAGS
        .iter()
        .map(|tag| {
            let mark = if tags.contains(tag.id) { "[x]" } else { "[ ]" };
            ListItem::new(format!("{mark} {}", tag.label))
        })
        .collect();

    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title("Companion style"),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    if focused {
        state.select(Some(view.tag_cursor));
    }
    f.render_stateful_widget(list, parts[0], &mut state);

    if let Some(tag) = view.selected_tag().filter(|_| focused) {
        let description = Paragraph::new(tag.description)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(tag.label));
        f.render_widget(description, parts[1]);
    }
}

/// A `width` x `height` rectangle centered in `area`, shrunk to fit.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

pub fn helpline_lines() -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(HELPLINE_INTRO), Line::default()];
    for helpline in HELPLINES {
        lines.push(Line::from(Span::styled(
            helpline.name,
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(format!("  {}", helpline.phone)));
        lines.push(Line::from(Span::styled(
            format!("  {}", helpline.website),
            Style::default().fg(Color::Cyan),
        )));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Press Esc to close",
        Style::default().add_modifier(Modifier::DIM),
    )));
    lines
}

fn render_helpline_modal(f: &mut Frame, area: Rect) {
    let width = 64.min(area.width);
    let rows = wrap_lines(&helpline_lines(), width.saturating_sub(2));
    let height = u16::try_from(rows.len()).unwrap_or(u16::MAX).saturating_add(2);
    let rect = centered_rect(width, height, area);

    let modal = Paragraph::new(rows).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta))
            .title(HELPLINE_HEADING),
    );
    f.render_widget(Clear, rect);
    f.render_widget(modal, rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::{apply_action, AppAction};
    use crate::utils::test_utils::create_test_app;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn render(app: &App, view: &mut ChatView<'_>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).expect("terminal");
        terminal.draw(|f| ui(f, app, view)).expect("draw");
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn transcript_lines_label_speakers_and_pending_turns() {
        let turns = vec![Turn::user("hi\nthere"), Turn::pending()];
        let lines = transcript_lines(&turns);
        let text: Vec<String> = lines.iter().map(|line| line.to_string()).collect();
        assert_eq!(text, vec!["You", "hi", "there", "", "Companion", "…", ""]);
    }

    #[test]
    fn wrap_lines_counts_wrapped_rows() {
        let lines = vec![Line::from("abcdefghij"), Line::default(), Line::from("abc")];
        assert_eq!(wrap_lines(&lines, 4).len(), 3 + 1 + 1);
        assert_eq!(wrap_lines(&lines, 0).len(), 10 + 1 + 3);
    }

    #[test]
    fn word_wrap_can_need_more_rows_than_columns_suggest() {
        let line = Line::from("aaaaaa bbbbbb cccccc");
        let rows: Vec<String> = wrap_line(&line, 10).iter().map(|row| row.to_string()).collect();
        assert_eq!(rows, vec!["aaaaaa ", "bbbbbb ", "cccccc"]);
        assert_eq!(wrap_lines(&[line], 10).len(), 3);
    }

    #[test]
    fn long_words_are_split_and_styles_kept() {
        let line = Line::from(vec![
            Span::styled("ab", Style::default().fg(Color::Red)),
            Span::raw("cdefghij"),
        ]);
        let rows = wrap_line(&line, 4);
        let text: Vec<String> = rows.iter().map(|row| row.to_string()).collect();
        assert_eq!(text, vec!["abcd", "efgh", "ij"]);
        assert_eq!(rows[0].spans[0].style.fg, Some(Color::Red));
        assert_eq!(wrap_line(&Line::default(), 4).len(), 1);
    }

    #[test]
    fn long_reply_scrolls_to_its_last_word() {
        let mut app = create_test_app();
        let mut reply: Vec<String> = (0..40).map(|_| "x".repeat(39)).collect();
        reply.push("FINALWORD".to_string());
        app.conversation.append(Turn::model(reply.join(" ")));

        let mut view = ChatView::new();
        let screen = render(&app, &mut view);
        assert!(screen.contains("FINALWORD"));
    }

    #[test]
    fn centered_rect_fits_inside_area() {
        let area = Rect::new(0, 0, 40, 10);
        assert_eq!(centered_rect(20, 4, area), Rect::new(10, 3, 20, 4));
        assert_eq!(centered_rect(80, 40, area), area);
    }

    #[test]
    fn demo_banner_and_greeting_are_rendered() {
        let app = create_test_app();
        let mut view = ChatView::new();
        let screen = render(&app, &mut view);
        assert!(screen.contains("DEMO"));
        assert!(screen.contains("ACT Companion"));
        assert!(screen.contains("[x] Empathetic"));
        assert!(screen.contains("[ ] Values-driven"));
    }

    #[test]
    fn helpline_modal_appears_after_sensitive_input() {
        let mut app = create_test_app();
        apply_action(
            &mut app,
            AppAction::SubmitMessage {
                message: "I feel hopeless".to_string(),
            },
        );
        let mut view = ChatView::new();
        let screen = render(&app, &mut view);
        assert!(screen.contains(HELPLINE_HEADING));
        assert!(screen.contains("988"));
    }
}
