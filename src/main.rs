mod app;
mod calendar;
mod components;
mod config;
mod logging;
mod theme;
mod tui;

use std::time::Duration;

use app::{App, InputMode, ViewMode};
use calendar::{EventStore, FileStorage, Storage};
use chrono::Local;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use config::Config;
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::widgets::Block;

fn main() -> Result<()> {
    color_eyre::install()?;

    let config = Config::load()?;
    logging::init(&config.log_level, &config.log_path())?;
    tracing::info!(data_dir = %config.data_dir.display(), slot = %config.storage_slot, "starting");

    let store = EventStore::new(FileStorage::new(&config.data_dir), config.storage_slot.clone());
    let mut app = App::new(store, &config, Local::now().date_naive());

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let mut terminal = tui::init().wrap_err("initialising terminal")?;
    let result = run(&mut terminal, &mut app);
    tui::restore().wrap_err("restoring terminal")?;
    tracing::info!("exiting");
    result
}

fn run<S: Storage>(terminal: &mut tui::Tui, app: &mut App<S>) -> Result<()> {
    while app.running {
        terminal.draw(|frame| draw(frame, app))?;

        if let Some(key) = tui::next_key_press(Duration::from_millis(250))? {
            // Clear status message on any key
            app.status_message = None;

            // Help overlay takes priority
            if app.show_help {
                if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
                    app.show_help = false;
                }
                continue;
            }

            match app.input_mode() {
                InputMode::Form => handle_form_input(app, key.code, key.modifiers),
                InputMode::Normal => handle_normal_input(app, key.code, key.modifiers),
            }
        }
    }

    Ok(())
}

fn handle_normal_input<S: Storage>(app: &mut App<S>, code: KeyCode, modifiers: KeyModifiers) {
    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            app.running = false;
        }
        (KeyCode::Char('1'), _) => app.view_mode = ViewMode::Month,
        (KeyCode::Char('2'), _) => app.view_mode = ViewMode::Week,
        (KeyCode::Char('3'), _) => app.view_mode = ViewMode::Day,
        (KeyCode::Char('t'), _) => app.go_to_today(Local::now().date_naive()),
        (KeyCode::Char('m'), _) => app.toggle_theme(),
        (KeyCode::Char('n'), _) => app.open_new_event(),
        (KeyCode::Enter, _) => app.open_selected_event(),
        (KeyCode::Left, _) | (KeyCode::Char('h'), _) => app.prev_day(),
        (KeyCode::Right, _) | (KeyCode::Char('l'), _) => app.next_day(),
        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => app.cursor_up(),
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => app.cursor_down(),
        (KeyCode::Char('H'), _) => app.prev_week(),
        (KeyCode::Char('L'), _) => app.next_week(),
        (KeyCode::Char('['), _) => app.prev_month(),
        (KeyCode::Char(']'), _) => app.next_month(),
        (KeyCode::Char('?'), _) => app.show_help = true,
        _ => {}
    }
}

fn handle_form_input<S: Storage>(app: &mut App<S>, code: KeyCode, modifiers: KeyModifiers) {
    match (code, modifiers) {
        (KeyCode::Esc, _) => app.close_event_form(),
        (KeyCode::Enter, _) => app.submit_form(),
        (KeyCode::Char('d'), KeyModifiers::CONTROL) => app.delete_form_event(),
        (KeyCode::Tab, _) | (KeyCode::Down, _) => app.form_tab(),
        (KeyCode::BackTab, _) | (KeyCode::Up, _) => app.form_backtab(),
        (KeyCode::Backspace, _) => app.form_backspace(),
        (KeyCode::Delete, _) => app.set_form_field(app.form.active_field, ""),
        (KeyCode::Char(c), m) if !m.contains(KeyModifiers::CONTROL) => app.form_input_char(c),
        _ => {}
    }
}

fn draw<S: Storage>(frame: &mut ratatui::Frame, app: &App<S>) {
    let area = frame.area();
    let theme = &app.theme;
    frame.render_widget(Block::default().style(theme.base), area);

    // Main layout: content + status bar
    let layout = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);
    let content_area = layout[0];

    match app.view_mode {
        ViewMode::Month => render_month_layout(frame, content_area, app),
        ViewMode::Week => {
            components::WeekView::render(
                frame,
                content_area,
                app.selected_date,
                app.today,
                app.week_start(),
                &app.week_events(),
                theme,
            );
        }
        ViewMode::Day => {
            components::DayView::render(
                frame,
                content_area,
                app.selected_date,
                &app.day_events(),
                app.day_cursor,
                theme,
            );
        }
    }

    if let Some(session) = app.session() {
        components::EventForm::render(frame, area, session, &app.form, theme);
    }

    if app.show_help {
        render_help(frame, area, theme);
    }

    components::StatusBar::render(
        frame,
        layout[1],
        app.view_mode,
        app.input_mode(),
        app.status_message.as_ref(),
        theme,
    );
}

fn render_month_layout<S: Storage>(frame: &mut ratatui::Frame, area: Rect, app: &App<S>) {
    let theme = &app.theme;
    let days_with_events = app.days_with_events();

    if area.width < 60 {
        components::MonthView::render(
            frame, area, app.selected_date, app.today, &days_with_events, theme,
        );
    } else {
        let month_w = if area.width >= 100 { 44 } else { 37 };
        let content =
            Layout::horizontal([Constraint::Length(month_w), Constraint::Min(20)]).split(area);

        components::MonthView::render(
            frame, content[0], app.selected_date, app.today, &days_with_events, theme,
        );
        components::DayView::render(
            frame,
            content[1],
            app.selected_date,
            &app.day_events(),
            app.day_cursor,
            theme,
        );
    }
}

fn render_help(frame: &mut ratatui::Frame, area: Rect, theme: &theme::Theme) {
    use ratatui::style::Modifier;
    use ratatui::text::{Line, Span};
    use ratatui::widgets::{Borders, Clear, Paragraph, Wrap};

    let popup_w = area.width.clamp(30, 52);
    let popup_h = area.height.clamp(12, 24);
    let x = area.x + (area.width.saturating_sub(popup_w)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_h)) / 2;
    let popup_area = Rect::new(x, y, popup_w, popup_h).intersection(area);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Keybindings ")
        .title_style(theme.accent.add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(theme.accent)
        .style(theme.base);

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key_style = theme.header;
    let section_style = theme.header.add_modifier(Modifier::UNDERLINED);
    let entry = |keys: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {keys:<10}"), key_style),
            Span::raw(desc),
        ])
    };

    let lines = vec![
        Line::from(Span::styled("Navigation", section_style)),
        entry("h/l", "Previous/next day"),
        entry("H/L", "Previous/next week"),
        entry("[/]", "Previous/next month"),
        entry("j/k", "Move between the day's events"),
        entry("t", "Jump to today"),
        entry("1/2/3", "Month / Week / Day view"),
        Line::from(""),
        Line::from(Span::styled("Events", section_style)),
        entry("n", "New event on selected day"),
        entry("Enter", "Edit selected event"),
        entry("Tab", "Next form field"),
        entry("Del", "Clear form field"),
        entry("Ctrl-D", "Delete event being edited"),
        entry("Esc", "Cancel form"),
        Line::from(""),
        entry("m", "Toggle dark/light mode"),
        entry("q", "Quit"),
    ];

    let para = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(para, inner);
}
