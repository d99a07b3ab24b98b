use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{InputMode, StatusMessage, ViewMode};
use crate::theme::Theme;

pub struct StatusBar;

impl StatusBar {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        mode: ViewMode,
        input: InputMode,
        message: Option<&StatusMessage>,
        theme: &Theme,
    ) {
        let w = area.width as usize;

        let mode_str = match mode {
            ViewMode::Month => "[1]Month",
            ViewMode::Week => "[2]Week",
            ViewMode::Day => "[3]Day",
        };
        let focus_indicator = match input {
            InputMode::Form => " [Form]",
            InputMode::Normal => "",
        };

        // Show status message if present, otherwise show context-aware hints
        let (right_text, right_style) = match message {
            Some(msg) if msg.is_error => {
                (format!(" {} ", msg.text), theme.status.patch(theme.error))
            }
            Some(msg) => (format!(" {} ", msg.text), theme.status),
            None => (hints(input, w).to_string(), theme.status),
        };

        let left = format!(" {mode_str}{focus_indicator} ");
        let padding = " ".repeat(w.saturating_sub(left.len() + right_text.chars().count()));

        let line = Line::from(vec![
            Span::styled(left, theme.status),
            Span::styled(padding, theme.status),
            Span::styled(right_text, right_style),
        ]);

        frame.render_widget(Paragraph::new(line).style(theme.status), area);
    }
}

fn hints(input: InputMode, w: usize) -> &'static str {
    match input {
        InputMode::Form if w >= 60 => " Tab:Field Enter:Save ^D:Delete Esc:Cancel",
        InputMode::Form => " Enter:Save Esc:Cancel",
        InputMode::Normal if w >= 80 => {
            " hl:Day jk:Event [/]:Month t:Today n:New Enter:Edit m:Theme ?:Help q:Quit"
        }
        InputMode::Normal if w >= 50 => " n:New Enter:Edit ?:Help q:Quit",
        InputMode::Normal => " ?:Help q:Quit",
    }
}
