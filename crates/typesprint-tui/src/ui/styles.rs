use ratatui::style::{Color, Modifier, Style};

use typesprint_core::typing::CharState;

// Color palette
pub const PRIMARY: Color = Color::Rgb(64, 128, 192);
pub const SECONDARY: Color = Color::Rgb(96, 160, 96);
pub const ACCENT: Color = Color::Rgb(192, 160, 64);
pub const ERROR: Color = Color::Rgb(192, 64, 64);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const HIGHLIGHT: Color = Color::Rgb(48, 48, 64);

// Styles
pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default()
        .bg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn success_style() -> Style {
    Style::default().fg(SECONDARY)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(32, 32, 40)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default()
        .fg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

/// Green at 95% and above, amber from 85%, red below.
pub fn accuracy_style(accuracy: f64) -> Style {
    let color = if accuracy >= 95.0 {
        SECONDARY
    } else if accuracy >= 85.0 {
        ACCENT
    } else {
        ERROR
    };
    Style::default().fg(color)
}

// Typed text
pub fn char_style(state: CharState) -> Style {
    match state {
        CharState::Correct => Style::default().fg(SECONDARY).add_modifier(Modifier::BOLD),
        // Background so mistyped spaces stay visible
        CharState::Incorrect => Style::default().fg(Color::White).bg(ERROR),
        CharState::Cursor => Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::UNDERLINED | Modifier::BOLD),
        CharState::Pending => Style::default().fg(MUTED),
    }
}
