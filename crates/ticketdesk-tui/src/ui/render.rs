use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use ticketdesk_core::forms::{FormFields, FormMessage};
use ticketdesk_core::Route;

use crate::app::{App, AppState};

use super::styles;

/// Width of the visible part of a form field
const FIELD_WIDTH: usize = 24;

/// Width of the dashboard sidebar
const SIDEBAR_WIDTH: u16 = 28;

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

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ConfirmingQuit => {
            render_confirm_overlay(frame, "Are you sure you want to quit?", "quit")
        }
        AppState::ConfirmingLogout => {
            render_confirm_overlay(frame, "Log out of ticketdesk?", "log out")
        }
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!("  ticketdesk  {}", app.route.title());
    let right = match app.auth.user() {
        Some(user) => {
            let role = user.role();
            vec![
                Span::styled(format!("{} ", user.display_name()), styles::muted_style()),
                Span::styled(format!("[{}]", role.display_name()), styles::role_style(&role)),
            ]
        }
        None => vec![Span::styled("not signed in", styles::muted_style())],
    };
    let right_width: usize = right.iter().map(|s| s.content.chars().count()).sum();

    let mut spans = vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.chars().count() + right_width + 2),
        )),
    ];
    spans.extend(right);
    let title_line = Line::from(spans);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    if app.is_loading() {
        render_loading(frame, area);
        return;
    }

    match &app.route {
        Route::Login => {
            let form = &app.login_form;
            render_form(
                frame,
                area,
                "Sign in",
                &form.fields,
                "Login",
                form.message.as_ref(),
                "[Ctrl+N] create account  [Ctrl+R] reset password  [Esc] quit",
            );
        }
        Route::Register => {
            let form = &app.register_form;
            render_form(
                frame,
                area,
                "Create account",
                &form.fields,
                "Register",
                form.message.as_ref(),
                "[Esc] back to login",
            );
        }
        Route::ResetPassword { .. } => {
            let form = &app.reset_form;
            let hint = if form.token.is_some() {
                "[Esc] back to login"
            } else {
                "No reset token given. Start with --reset-token <token>."
            };
            render_form(
                frame,
                area,
                "Reset password",
                &form.fields,
                "Reset",
                form.message.as_ref(),
                hint,
            );
        }
        Route::Dashboard => render_dashboard(frame, app, area),
        Route::Unauthorized => render_unauthorized(frame, area),
    }
}

fn render_loading(frame: &mut Frame, area: Rect) {
    let area = centered_rect_fixed(40, 5, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("   Restoring session...", styles::muted_style())),
    ];
    frame.render_widget(Paragraph::new(text).block(block), area);
}

/// Render a bordered form: labelled fields, a submit button, an optional
/// message and a hint line.
fn render_form(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    fields: &FormFields,
    submit_label: &str,
    message: Option<&FormMessage>,
    hint: &str,
) {
    let label_width = fields
        .fields()
        .iter()
        .map(|f| f.label.chars().count())
        .max()
        .unwrap_or(0);

    let mut lines = vec![Line::from("")];

    for (i, field) in fields.fields().iter().enumerate() {
        let focused = fields.is_field_focused(i);
        let style = styles::field_style(focused);
        // Show the tail of long values so the cursor stays visible
        let shown: String = {
            let display = field.display();
            let count = display.chars().count();
            display.chars().skip(count.saturating_sub(FIELD_WIDTH)).collect()
        };
        let cursor = if focused { "▌" } else { " " };
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(
                format!("{:>width$}: [", field.label, width = label_width),
                styles::muted_style(),
            ),
            Span::styled(format!("{:<width$}{}", shown, cursor, width = FIELD_WIDTH), style),
            Span::styled("]", styles::muted_style()),
        ]));
    }

    lines.push(Line::from(""));
    let button_pad = " ".repeat(label_width + 8);
    let submit_focused = fields.is_submit_focused();
    let button = if submit_focused {
        format!(" ▶ {} ◀ ", submit_label)
    } else {
        format!("   {}   ", submit_label)
    };
    lines.push(Line::from(vec![
        Span::raw(format!("{}[", button_pad)),
        Span::styled(button, styles::field_style(submit_focused)),
        Span::raw("]"),
    ]));

    if let Some(message) = message {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {}", message.text),
            styles::message_style(message.kind),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(format!("  {}", hint), styles::muted_style())));

    let width = (label_width + FIELD_WIDTH + 10).max(hint.chars().count() + 6) as u16;
    let height = lines.len() as u16 + 2;
    let area = centered_rect_fixed(width, height, area);

    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(Span::styled(format!(" {} ", title), styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

fn render_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(30)])
        .split(area);

    render_menu(frame, app, chunks[0]);
    render_summary(frame, app, chunks[1]);
}

fn render_menu(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();
    let mut index = 0;

    for section in app.menu_sections() {
        lines.push(Line::from(Span::styled(
            format!(" {}", section.title.to_uppercase()),
            styles::section_style(),
        )));
        for item in section.items {
            let selected = index == app.menu_selection;
            let marker = if selected { "▶ " } else { "  " };
            lines.push(Line::from(Span::styled(
                format!(" {}{}", marker, item.label()),
                styles::field_style(selected),
            )));
            index += 1;
        }
        lines.push(Line::from(""));
    }

    let title = match &app.preview_role {
        Some(role) => format!(" Menu (preview: {}) ", role.display_name()),
        None => " Menu ".to_string(),
    };
    let block = Block::default()
        .title(Span::styled(title, styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();

    if let Some(user) = app.auth.user() {
        lines.push(Line::from(vec![
            Span::raw(" Welcome back, "),
            Span::styled(user.display_name(), styles::accent_style()),
            Span::raw("!"),
        ]));
        let role = user.role();
        lines.push(Line::from(vec![
            Span::styled(" Signed in as ", styles::muted_style()),
            Span::styled(role.display_name().to_string(), styles::role_style(&role)),
        ]));
        if let Some(email) = &user.email {
            lines.push(Line::from(Span::styled(format!(" {}", email), styles::muted_style())));
        }
    }
    lines.push(Line::from(""));

    if let Some(error) = &app.dashboard_error {
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
        lines.push(Line::from(Span::styled(" Press [u] to retry", styles::muted_style())));
    } else if let Some(summary) = &app.dashboard {
        lines.push(Line::from(vec![
            Span::styled(" Tickets:  ", styles::muted_style()),
            Span::styled(summary.total().to_string(), styles::text_style()),
            Span::styled("   Yours:  ", styles::muted_style()),
            Span::styled(summary.owned_by_user.to_string(), styles::text_style()),
        ]));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(" Recent Activity", styles::section_style())));

        if summary.recent().is_empty() {
            lines.push(Line::from(Span::styled("  No tickets yet", styles::muted_style())));
        }
        for ticket in summary.recent() {
            lines.push(Line::from(vec![
                Span::styled(format!("  #{:<5}", ticket.id), styles::muted_style()),
                Span::styled(ticket.title.clone(), styles::text_style()),
            ]));
            lines.push(Line::from(Span::styled(
                format!("         {}", ticket.description_display()),
                styles::muted_style(),
            )));
        }
    } else {
        lines.push(Line::from(Span::styled(" Loading tickets...", styles::muted_style())));
    }

    let block = Block::default()
        .title(Span::styled(" Dashboard ", styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

fn render_unauthorized(frame: &mut Frame, area: Rect) {
    let area = centered_rect_fixed(50, 8, area);
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  You don't have permission to view that page.",
            styles::error_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", styles::muted_style()),
            Span::styled("[Enter]", styles::key_style()),
            Span::styled(" to return to the dashboard", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .title(Span::styled(" Unauthorized ", styles::error_style()))
        .borders(Borders::ALL)
        .border_style(styles::error_style());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.route {
        Route::Dashboard => "[?]help | [u]pdate | [l]ogout | [q]uit",
        Route::Unauthorized => "[Enter] back | [l]ogout | [q]uit",
        _ => "[Tab] next field | [Enter] submit",
    };

    let left_text = match &app.status_message {
        Some(msg) => format!(" {} ", msg),
        None => format!(" {} ", app.config.api_url()),
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

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::key_style()),
        Span::styled(desc, styles::text_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(50, 22, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled(
            format!("  ticketdesk {}", version),
            styles::title_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Dashboard", styles::accent_style())),
        help_line("↑/↓", "Navigate menu"),
        help_line("Enter", "Open menu entry"),
        help_line("r", "Preview another role's menu"),
        help_line("u", "Reload tickets"),
        help_line("l", "Log out"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled(" Forms", styles::accent_style())),
        help_line("Tab/↓", "Next field"),
        help_line("S-Tab/↑", "Previous field"),
        help_line("Enter", "Next field / submit"),
        help_line("Ctrl+N", "Create account (login)"),
        help_line("Ctrl+R", "Reset password (login)"),
        help_line("Esc", "Back / quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_confirm_overlay(frame: &mut Frame, question: &str, verb: &str) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("   {}", question), styles::accent_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::key_style()),
            Span::styled(format!(" to {}, ", verb), styles::muted_style()),
            Span::styled("[N]", styles::key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
