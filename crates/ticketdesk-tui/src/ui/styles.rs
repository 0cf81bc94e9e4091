//! ticketdesk color theme: teal brand color on slate, with role badges.

use ratatui::style::{Color, Modifier, Style};

use ticketdesk_core::forms::MessageKind;
use ticketdesk_core::models::Role;

pub const BRAND: Color = Color::Rgb(38, 166, 154);
pub const INK: Color = Color::Rgb(224, 224, 224);
pub const DIM: Color = Color::Rgb(120, 130, 140);
pub const OK: Color = Color::Rgb(102, 187, 106);
pub const DANGER: Color = Color::Rgb(229, 115, 115);
pub const WARN: Color = Color::Rgb(255, 183, 77);
pub const SELECTION: Color = Color::Rgb(38, 50, 56);
pub const BAR: Color = Color::Rgb(28, 36, 40);

pub fn title_style() -> Style {
    Style::default().fg(BRAND).add_modifier(Modifier::BOLD)
}

pub fn text_style() -> Style {
    Style::default().fg(INK)
}

pub fn muted_style() -> Style {
    Style::default().fg(DIM)
}

pub fn accent_style() -> Style {
    Style::default().fg(WARN)
}

pub fn error_style() -> Style {
    Style::default().fg(DANGER)
}

pub fn selected_style() -> Style {
    Style::default()
        .bg(SELECTION)
        .fg(BRAND)
        .add_modifier(Modifier::BOLD)
}

/// Input field or button, highlighted while it has focus
pub fn field_style(focused: bool) -> Style {
    if focused {
        selected_style()
    } else {
        text_style()
    }
}

pub fn message_style(kind: MessageKind) -> Style {
    match kind {
        MessageKind::Info => muted_style(),
        MessageKind::Success => Style::default().fg(OK),
        MessageKind::Error => error_style(),
    }
}

/// Section headings in the dashboard sidebar
pub fn section_style() -> Style {
    Style::default().fg(DIM).add_modifier(Modifier::BOLD)
}

/// Badge color for a role; privileged roles stand out
pub fn role_style(role: &Role) -> Style {
    let color = match role {
        Role::Admin => DANGER,
        Role::Manager => WARN,
        Role::Support => BRAND,
        Role::User | Role::Other(_) => INK,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

pub fn border_style(focused: bool) -> Style {
    Style::default().fg(if focused { BRAND } else { DIM })
}

pub fn status_bar_style() -> Style {
    Style::default().bg(BAR).fg(INK)
}

/// Key names in help text and prompts
pub fn key_style() -> Style {
    Style::default().fg(WARN).add_modifier(Modifier::BOLD)
}
