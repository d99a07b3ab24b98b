use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::theme::Theme;

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub struct MonthView;

impl MonthView {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        selected_date: NaiveDate,
        today: NaiveDate,
        days_with_events: &HashSet<u32>,
        theme: &Theme,
    ) {
        let year = selected_date.year();
        let month = selected_date.month();

        let block = Block::default()
            .title(format!(" {} ", selected_date.format("%B %Y")))
            .title_style(theme.header)
            .borders(Borders::ALL)
            .border_style(theme.border);

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let header = Line::from(
            DAY_NAMES
                .iter()
                .map(|d| Span::styled(format!("{d:^5}"), theme.header))
                .collect::<Vec<_>>(),
        );

        let Some(first_day) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return;
        };
        let lead = first_day.weekday().num_days_from_sunday();
        let days_in_month = days_in_month(first_day);

        let mut weeks: Vec<Line> = Vec::new();
        let mut cells: Vec<Span> = (0..lead).map(|_| Span::raw("     ")).collect();
        for date in first_day.iter_days().take_while(|d| d.month() == month) {
            let day = date.day();
            let marker = if days_with_events.contains(&day) { '*' } else { ' ' };

            let style = if date == today && date == selected_date {
                theme.today_selected()
            } else if date == selected_date {
                theme.selected
            } else if date == today {
                theme.today
            } else {
                Style::default()
            };

            cells.push(Span::styled(format!(" {day:>2}{marker} "), style));
            if cells.len() == 7 || day == days_in_month {
                weeks.push(Line::from(std::mem::take(&mut cells)));
            }
        }

        let mut constraints = vec![Constraint::Length(1); weeks.len() + 1];
        constraints.push(Constraint::Min(0));
        let rows = Layout::vertical(constraints).split(inner);

        frame.render_widget(Paragraph::new(header), rows[0]);
        for (week, row) in weeks.into_iter().zip(rows.iter().skip(1)) {
            frame.render_widget(Paragraph::new(week), *row);
        }
    }
}

fn days_in_month(first_day: NaiveDate) -> u32 {
    first_day
        .iter_days()
        .take_while(|d| d.month() == first_day.month())
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_leap_february() {
        let feb = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(days_in_month(feb), 29);
    }
}
