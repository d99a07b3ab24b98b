use chrono::NaiveDate;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::calendar::Event;
use crate::theme::Theme;

pub struct DayView;

impl DayView {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        date: NaiveDate,
        events: &[&Event],
        cursor: usize,
        theme: &Theme,
    ) {
        let w = area.width as usize;

        let title = if w >= 30 {
            format!(" {} ", date.format("%A, %B %d, %Y"))
        } else if w >= 18 {
            format!(" {} ", date.format("%b %d, %Y"))
        } else {
            format!(" {} ", date.format("%m/%d"))
        };

        let count_str = match events.len() {
            0 => String::new(),
            1 => " 1 event ".to_string(),
            n => format!(" {n} events "),
        };

        let block = Block::default()
            .title(title)
            .title_style(theme.header)
            .title_bottom(Line::from(Span::styled(count_str, theme.dim)))
            .borders(Borders::ALL)
            .border_style(theme.border);

        if events.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let msg = Paragraph::new("No events. Press n to add one.").style(theme.dim);
            frame.render_widget(msg, inner);
            return;
        }

        let inner_w = area.width.saturating_sub(2) as usize;
        let items: Vec<ListItem> = events
            .iter()
            .map(|ev| format_event(ev, date, inner_w, theme))
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(theme.highlight);
        let mut state = ListState::default().with_selected(Some(cursor.min(events.len() - 1)));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

fn format_event(ev: &Event, date: NaiveDate, max_width: usize, theme: &Theme) -> ListItem<'static> {
    let swatch = Span::styled("  ", Style::default().bg(ev.color.to_color()));

    let time_str = if ev.start.date() == date || ev.end.date() == date {
        format!(" {} ", ev.duration_display())
    } else {
        " (continues) ".to_string()
    };
    let time_span = Span::styled(time_str.clone(), Style::default().add_modifier(Modifier::DIM));
    let title_span = Span::raw(ev.title.clone());

    let mut spans = vec![swatch, time_span, title_span];

    // Only show the image reference if there's room
    if let Some(image) = &ev.image {
        let used = 2 + time_str.len() + ev.title.len();
        if used + 4 + image.len() <= max_width {
            spans.push(Span::styled(format!(" [{image}]"), theme.dim));
        } else {
            spans.push(Span::styled(" [img]", theme.dim));
        }
    }

    ListItem::new(Line::from(spans))
}
