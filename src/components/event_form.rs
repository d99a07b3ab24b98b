use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::calendar::editor::{EditSession, SessionMode};
use crate::calendar::event::parse_color;
use crate::calendar::DraftField;
use crate::theme::Theme;

/// Which field has the cursor. Lives outside the draft; focus is not
/// part of the event being edited.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub active_field: DraftField,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            active_field: DraftField::Title,
        }
    }
}

pub struct EventForm;

impl EventForm {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        session: &EditSession,
        form: &FormState,
        theme: &Theme,
    ) {
        // Center the form popup
        let form_w = area.width.clamp(30, 56);
        let form_h = area.height.clamp(10, 14);
        let x = area.x + (area.width.saturating_sub(form_w)) / 2;
        let y = area.y + (area.height.saturating_sub(form_h)) / 2;
        let form_area = Rect::new(x, y, form_w, form_h).intersection(area);

        frame.render_widget(Clear, form_area);

        let editing = matches!(session.mode, SessionMode::Editing { .. });
        let title = if editing { " Edit Event " } else { " Add Event " };

        let block = Block::default()
            .title(title)
            .title_style(theme.accent.add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_style(theme.accent)
            .style(theme.base);

        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let mut constraints = vec![Constraint::Length(1); DraftField::ALL.len()];
        constraints.push(Constraint::Length(1)); // spacer
        constraints.push(Constraint::Length(1)); // help
        constraints.push(Constraint::Min(0));
        let rows = Layout::vertical(constraints).split(inner);

        let draft = &session.draft;
        for (row, field) in rows.iter().zip(DraftField::ALL) {
            let active = form.active_field == field;
            let value = draft.field(field);
            if field == DraftField::Color {
                render_color_field(frame, *row, value, active, theme);
            } else {
                render_field(frame, *row, label(field), value, active, theme);
            }
        }

        let key = Style::default().add_modifier(Modifier::BOLD);
        let mut help = vec![
            Span::styled("Tab", key),
            Span::styled(":Next ", theme.dim),
            Span::styled("Enter", key),
            Span::styled(if editing { ":Update " } else { ":Add " }, theme.dim),
        ];
        if editing {
            help.push(Span::styled("^D", key));
            help.push(Span::styled(":Delete ", theme.dim));
        }
        help.push(Span::styled("Esc", key));
        help.push(Span::styled(":Cancel", theme.dim));
        if let Some(help_row) = rows.get(DraftField::ALL.len() + 1) {
            frame.render_widget(Paragraph::new(Line::from(help)), *help_row);
        }
    }
}

fn label(field: DraftField) -> &'static str {
    match field {
        DraftField::Title => "Title:",
        DraftField::StartDate => "Start:",
        DraftField::StartTime => "  at:",
        DraftField::EndDate => "End:",
        DraftField::EndTime => "  at:",
        DraftField::Color => "Color:",
        DraftField::Image => "Image:",
    }
}

fn placeholder(label: &str) -> &'static str {
    match label {
        "Start:" | "End:" => "YYYY-MM-DD",
        "  at:" => "HH:MM",
        "Image:" => "path or URL",
        _ => "",
    }
}

fn render_field(
    frame: &mut Frame,
    area: Rect,
    label: &str,
    value: &str,
    active: bool,
    theme: &Theme,
) {
    let cursor = if active { "_" } else { "" };

    let style = if active {
        theme.selected
    } else {
        Style::default()
    };

    let mut spans = vec![Span::styled(format!("{label:<7}"), theme.dim)];
    if value.is_empty() && !active {
        spans.push(Span::styled(placeholder(label), theme.dim.add_modifier(Modifier::ITALIC)));
    } else {
        spans.push(Span::styled(format!("{value}{cursor}"), style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_color_field(frame: &mut Frame, area: Rect, value: &str, active: bool, theme: &Theme) {
    let swatch = match parse_color(value) {
        Some(color) => Span::styled("  ", Style::default().bg(color)),
        None if value.is_empty() => Span::styled("  ", theme.dim),
        None => Span::styled("??", theme.error),
    };
    let cursor = if active { "_" } else { "" };
    let style = if active { theme.selected } else { Style::default() };

    let line = Line::from(vec![
        Span::styled(format!("{:<7}", "Color:"), theme.dim),
        swatch,
        Span::raw(" "),
        Span::styled(format!("{value}{cursor}"), style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
