use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use typesprint_core::auth::GateDecision;
use typesprint_core::typing::{Phase, TimerMode, TypingSession};

use crate::app::{App, AppState, LoginFocus, SubmitStatus};
use crate::nav::Route;

use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!("  typesprint - {}", app.nav.current().title());
    let right = match app.auth_state.user() {
        Some(user) => format!("{} | [F1] Help", user.display_name()),
        None => "[F1] Help".to_string(),
    };

    let title_line = Line::from(vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + right.len() + 4),
        )),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    let route = app.nav.current();
    if route == Route::Login {
        render_login(frame, app, area);
        return;
    }

    match app.gate() {
        GateDecision::Render => match route {
            Route::History => render_history(frame, app, area),
            _ => render_typing(frame, app, area),
        },
        // Redirects are applied on the next event; keep the screen neutral
        GateDecision::Placeholder | GateDecision::Redirect { .. } => {
            render_placeholder(frame, area)
        }
    }
}

fn render_placeholder(frame: &mut Frame, area: Rect) {
    let area = centered_rect_fixed(30, 3, area);
    let paragraph = Paragraph::new(Line::from(Span::styled(
        "  Checking session...",
        styles::muted_style(),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border_style(false)),
    );
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Typing screen
// ============================================================================

/// One styled span per source character.
pub fn typing_spans(session: &TypingSession) -> Vec<Span<'static>> {
    session
        .source()
        .iter()
        .zip(session.classifications())
        .map(|(c, state)| Span::styled(c.to_string(), styles::char_style(state)))
        .collect()
}

/// `m:ss`
pub fn format_timer(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn render_typing(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Stats
            Constraint::Min(5),    // Text
            Constraint::Length(5), // Results
        ])
        .split(area);

    render_typing_stats(frame, app, chunks[0]);

    let title = match &app.current_text {
        Some(text) => format!(" {} ({} words) ", text.title, text.word_count()),
        None => " Practice text ".to_string(),
    };
    let text = Paragraph::new(Line::from(typing_spans(&app.typing)))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(app.typing.phase() != Phase::Completed)),
        );
    frame.render_widget(text, chunks[1]);

    render_typing_results(frame, app, chunks[2]);
}

fn render_typing_stats(frame: &mut Frame, app: &App, area: Rect) {
    let stats = app.live_results();
    let mode = match app.typing.timer_mode() {
        TimerMode::CountDown(secs) => format!("count-down {}s", secs),
        TimerMode::CountUp => "count-up".to_string(),
    };
    let phase = match app.typing.phase() {
        Phase::Ready => "start typing",
        Phase::Active => "typing",
        Phase::Completed => "done",
    };

    let line = Line::from(vec![
        Span::styled(" Time ", styles::muted_style()),
        Span::styled(format_timer(app.typing.timer_display()), styles::highlight_style()),
        Span::styled("   WPM ", styles::muted_style()),
        Span::styled(format!("{}", stats.wpm), styles::highlight_style()),
        Span::styled("   Accuracy ", styles::muted_style()),
        Span::styled(
            format!("{}%", stats.accuracy_display()),
            styles::accuracy_style(stats.accuracy),
        ),
        Span::styled(format!("   [{}] {}", mode, phase), styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_typing_results(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![];

    match app.typing.results() {
        Some(results) => {
            lines.push(Line::from(vec![
                Span::styled(" Result: ", styles::muted_style()),
                Span::styled(format!("{} WPM", results.wpm), styles::title_style()),
                Span::styled("  at  ", styles::muted_style()),
                Span::styled(
                    format!("{}% accuracy", results.accuracy_display()),
                    styles::accuracy_style(results.accuracy).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(
                        "  ({}/{} correct in {})",
                        results.correct_chars,
                        results.typed_chars,
                        format_timer(results.elapsed_secs)
                    ),
                    styles::muted_style(),
                ),
            ]));

            let status = match &app.submit_status {
                SubmitStatus::Idle => Line::from(""),
                SubmitStatus::Saved => {
                    Line::from(Span::styled(" Result saved to your history", styles::success_style()))
                }
                SubmitStatus::Skipped(reason) => {
                    Line::from(Span::styled(format!(" {}", reason), styles::muted_style()))
                }
                SubmitStatus::Failed { message, .. } => {
                    let mut spans = vec![Span::styled(
                        format!(" Could not save result: {}", message),
                        styles::error_style(),
                    )];
                    if app.can_retry_submission() {
                        spans.push(Span::styled("  [Ctrl+S] retry", styles::help_key_style()));
                    }
                    Line::from(spans)
                }
            };
            lines.push(status);
        }
        None => {
            lines.push(Line::from(Span::styled(
                " The timer starts with your first keystroke.",
                styles::muted_style(),
            )));
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

// ============================================================================
// History screen
// ============================================================================

fn render_history(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.history_summary() {
        Some(summary) => format!(
            " History ({}) - best {} wpm, avg {} wpm, avg {:.1}% accuracy ",
            summary.tests, summary.best_wpm, summary.average_wpm, summary.average_accuracy
        ),
        None => " History ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if app.history.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            " No results yet. Finish a test to see it here.",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new([
        Cell::from("Date"),
        Cell::from("Text"),
        Cell::from("WPM"),
        Cell::from("Accuracy"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .history
        .iter()
        .map(|record| {
            let date = record
                .created_at
                .with_timezone(&Local)
                .format("%b %d, %Y %H:%M")
                .to_string();
            Row::new(vec![
                Cell::from(date),
                Cell::from(app.text_title(&record.text_ref).to_string()),
                Cell::from(format!("{}", record.wpm)),
                Cell::from(format!("{:.1}%", record.accuracy))
                    .style(styles::accuracy_style(record.accuracy)),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Length(20), // "Jan 26, 2026 14:05" + padding
        Constraint::Fill(1),
        Constraint::Length(6),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.history_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

// ============================================================================
// Login screen
// ============================================================================

fn render_login(frame: &mut Frame, app: &App, area: Rect) {
    let height = if app.login_error.is_some() { 13 } else { 11 };
    let area = centered_rect_fixed(46, height, area);

    frame.render_widget(Clear, area);

    let mut lines = vec![];

    lines.push(Line::from(Span::styled(
        "           t y p e s p r i n t",
        styles::title_style(),
    )));
    lines.push(Line::from(""));

    let username_focused = app.login_focus == LoginFocus::Username;
    let username_style = if username_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    // Show the tail of long input so the cursor stays in view
    let visible: String = tail(&app.login_username, 16);
    let cursor = if username_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("      "),
        Span::styled("Username: [", styles::muted_style()),
        Span::styled(format!("{:<16}{}", visible, cursor), username_style),
        Span::styled("]", styles::muted_style()),
    ]));

    let password_focused = app.login_focus == LoginFocus::Password;
    let password_style = if password_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let password_masked = "*".repeat(app.login_password.chars().count().min(16));
    let cursor = if password_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("      "),
        Span::styled("Password: [", styles::muted_style()),
        Span::styled(format!("{:<16}{}", password_masked, cursor), password_style),
        Span::styled("]", styles::muted_style()),
    ]));

    let button_focused = app.login_focus == LoginFocus::Button;
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    lines.push(Line::from(""));
    let label = if button_focused { " ▶ Login ◀ " } else { "   Login   " };
    lines.push(Line::from(vec![
        Span::raw("            ["),
        Span::styled(label, button_style),
        Span::raw("]"),
    ]));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "   No account? Run: typesprint --register",
        styles::muted_style(),
    )));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn tail(value: &str, max_chars: usize) -> String {
    let count = value.chars().count();
    value.chars().skip(count.saturating_sub(max_chars)).collect()
}

// ============================================================================
// Status bar and overlays
// ============================================================================

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.nav.current() {
        Route::Login => "[Tab] next field | [Enter] login | [Esc] quit",
        Route::Typing => "[Esc] end | ^N new | ^T timer | ^R history | ^L logout",
        Route::History => "[↑/↓] select | [r]efresh | [Esc] back | ^L logout",
    };

    let left_text = match (&app.status_message, app.auth_state.user()) {
        (Some(msg), _) => format!(" {} ", msg),
        (None, Some(user)) => format!(" Signed in as {} ", user.display_name()),
        (None, None) => String::new(),
    };
    let right_text = format!(" {} ", shortcuts);

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 21, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");
    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", k), styles::help_key_style()),
            Span::styled(desc, styles::help_desc_style()),
        ])
    };

    let help_text = vec![
        Line::from(Span::styled("  typesprint", styles::title_style())),
        Line::from(Span::styled(format!("  version {}", version), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Typing", styles::highlight_style())),
        key("Esc", "End the test early"),
        key("Ctrl+N", "New test with a random text"),
        key("Ctrl+Z", "Restart the same text"),
        key("Ctrl+T", "Toggle count-down / count-up timer"),
        key("Ctrl+S", "Retry saving a failed result"),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        key("Ctrl+R", "Result history"),
        key("Ctrl+L", "Log out"),
        key("Ctrl+Q", "Quit"),
        Line::from(""),
        Line::from(Span::styled(" History", styles::highlight_style())),
        key("↑/↓", "Select result"),
        key("r", "Refresh"),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("F1", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use typesprint_core::auth::MemoryTokenStore;
    use typesprint_core::typing::CharState;

    use crate::app::test_support::offline_app;

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_protected_screen_shows_placeholder_while_initializing() {
        let app = offline_app(MemoryTokenStore::new());
        assert_eq!(app.nav.current(), Route::Typing);
        let text = screen_text(&app);
        assert!(text.contains("Checking session..."));
        assert!(!text.contains("WPM"));
    }

    #[tokio::test]
    async fn test_login_screen_points_to_registration() {
        let mut app = offline_app(MemoryTokenStore::new());
        app.nav.replace(Route::Login);
        app.login_error = Some("Invalid username or password".to_string());
        let text = screen_text(&app);
        assert!(text.contains("typesprint --register"));
        assert!(text.contains("Invalid username or password"));
    }

    #[test]
    fn test_typing_spans_follow_classification() {
        let mut session = TypingSession::new("cat", None, TimerMode::CountUp);
        session.type_char('c');

        let spans = typing_spans(&session);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].content, "c");
        assert_eq!(spans[0].style, styles::char_style(CharState::Correct));
        assert_eq!(spans[1].style, styles::char_style(CharState::Cursor));
        assert_eq!(spans[2].style, styles::char_style(CharState::Pending));

        session.type_char('x');
        let spans = typing_spans(&session);
        assert_eq!(spans[1].content, "a");
        assert_eq!(spans[1].style, styles::char_style(CharState::Incorrect));
    }

    #[test]
    fn test_format_timer() {
        assert_eq!(format_timer(0), "0:00");
        assert_eq!(format_timer(59), "0:59");
        assert_eq!(format_timer(60), "1:00");
        assert_eq!(format_timer(125), "2:05");
    }

    #[test]
    fn test_tail_keeps_last_chars() {
        assert_eq!(tail("ada", 16), "ada");
        assert_eq!(tail("abcdefghijklmnopqrst", 4), "qrst");
    }

    #[test]
    fn test_centered_rect_fits_inside() {
        let outer = Rect::new(0, 0, 100, 40);
        let inner = centered_rect_fixed(46, 9, outer);
        assert_eq!(inner, Rect::new(27, 15, 46, 9));

        let small = centered_rect_fixed(46, 9, Rect::new(0, 0, 20, 5));
        assert_eq!(small.width, 20);
        assert_eq!(small.height, 5);
    }
}
