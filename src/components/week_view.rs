use chrono::{Days, NaiveDate};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::calendar::event::format_time;
use crate::calendar::Event;
use crate::theme::Theme;

pub struct WeekView;

impl WeekView {
    /// `days` holds the events of each day, Sunday first.
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        selected_date: NaiveDate,
        today: NaiveDate,
        week_start: NaiveDate,
        days: &[Vec<&Event>; 7],
        theme: &Theme,
    ) {
        let block = Block::default()
            .title(format!(" Week of {} ", week_start.format("%b %d, %Y")))
            .title_style(theme.header)
            .borders(Borders::ALL)
            .border_style(theme.border);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if inner.width < 14 || inner.height < 3 {
            return;
        }

        let cols = Layout::horizontal(vec![Constraint::Ratio(1, 7); 7]).split(inner);

        for (offset, (col, events)) in cols.iter().zip(days.iter()).enumerate() {
            let Some(date) = week_start.checked_add_days(Days::new(offset as u64)) else {
                continue;
            };
            let col_w = col.width as usize;

            let day_label = if col_w >= 10 {
                date.format("%a %d").to_string()
            } else if col_w >= 5 {
                date.format("%a").to_string()
            } else {
                date.format("%d").to_string()
            };

            let style = if date == today && date == selected_date {
                theme.today_selected()
            } else if date == selected_date {
                theme.selected
            } else if date == today {
                theme.today
            } else {
                theme.header
            };

            let mut lines = vec![Line::from(Span::styled(
                format!("{day_label:^col_w$}"),
                style,
            ))];
            for ev in events {
                let text = if ev.start.date() == date {
                    format!("{} {}", format_time(ev.start.time()), ev.title)
                } else {
                    ev.title.clone()
                };
                lines.push(Line::from(vec![
                    Span::styled("\u{258c}", Style::default().fg(ev.color.to_color())),
                    Span::raw(truncate(&text, col_w.saturating_sub(1))),
                ]));
            }

            frame.render_widget(Paragraph::new(lines), *col);
        }
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('\u{2026}');
        out
    }
}
