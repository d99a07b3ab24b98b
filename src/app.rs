use std::collections::HashSet;

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::calendar::editor::{Draft, EditSession};
use crate::calendar::{
    DraftField, EditorState, Event, EventEditorController, EventStore, PersistenceWarning, Storage,
};
use crate::components::event_form::FormState;
use crate::config::Config;
use crate::theme::{Theme, ThemeMode};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewMode {
    Month,
    Week,
    Day,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Form,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

impl StatusMessage {
    fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

pub struct App<S: Storage> {
    pub running: bool,
    pub view_mode: ViewMode,
    pub selected_date: NaiveDate,
    pub today: NaiveDate,
    pub day_cursor: usize,
    pub form: FormState,
    pub status_message: Option<StatusMessage>,
    pub show_help: bool,
    pub theme_mode: ThemeMode,
    pub theme: Theme,
    dark_preset: Option<String>,
    store: EventStore<S>,
    editor: EventEditorController,
}

impl<S: Storage> App<S> {
    pub fn new(mut store: EventStore<S>, config: &Config, today: NaiveDate) -> Self {
        let loaded = store.load_all();

        Self {
            running: true,
            view_mode: ViewMode::Month,
            selected_date: today,
            today,
            day_cursor: 0,
            form: FormState::default(),
            status_message: loaded.warning.as_ref().map(warning_message),
            show_help: false,
            theme_mode: config.theme,
            theme: Theme::for_mode(config.theme, config.dark_preset.as_deref()),
            dark_preset: config.dark_preset.clone(),
            store,
            editor: EventEditorController::new(config.editor_rules()),
        }
    }

    pub fn events(&self) -> &[Event] {
        self.store.events()
    }

    pub fn input_mode(&self) -> InputMode {
        match self.editor.state() {
            EditorState::Closed => InputMode::Normal,
            EditorState::Creating | EditorState::Editing => InputMode::Form,
        }
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.editor.session()
    }

    /// Events touching `date`, earliest first.
    pub fn events_on(&self, date: NaiveDate) -> Vec<&Event> {
        let mut events: Vec<&Event> = self.events().iter().filter(|e| e.covers(date)).collect();
        events.sort_by_key(|e| e.start);
        events
    }

    pub fn day_events(&self) -> Vec<&Event> {
        self.events_on(self.selected_date)
    }

    pub fn selected_event(&self) -> Option<&Event> {
        self.day_events().get(self.day_cursor).copied()
    }

    /// Day numbers of the selected month that have at least one event.
    pub fn days_with_events(&self) -> HashSet<u32> {
        let year = self.selected_date.year();
        let month = self.selected_date.month();
        let mut days = HashSet::new();
        for ev in self.events() {
            let mut date = ev.start.date();
            let last = ev.end.date().max(date);
            while date <= last {
                if date.year() == year && date.month() == month {
                    days.insert(date.day());
                }
                match date.succ_opt() {
                    Some(next) => date = next,
                    None => break,
                }
            }
        }
        days
    }

    /// Events of each day of the selected week, Sunday first.
    pub fn week_events(&self) -> [Vec<&Event>; 7] {
        let start = self.week_start();
        std::array::from_fn(|i| {
            start
                .checked_add_days(Days::new(i as u64))
                .map(|date| self.events_on(date))
                .unwrap_or_default()
        })
    }

    /// Sunday starting the selected week.
    pub fn week_start(&self) -> NaiveDate {
        let offset = self.selected_date.weekday().num_days_from_sunday();
        self.selected_date
            .checked_sub_days(Days::new(offset.into()))
            .unwrap_or(self.selected_date)
    }

    // ── Navigation ──

    pub fn next_day(&mut self) {
        self.select_date(self.selected_date.succ_opt());
    }

    pub fn prev_day(&mut self) {
        self.select_date(self.selected_date.pred_opt());
    }

    pub fn next_week(&mut self) {
        self.select_date(self.selected_date.checked_add_days(Days::new(7)));
    }

    pub fn prev_week(&mut self) {
        self.select_date(self.selected_date.checked_sub_days(Days::new(7)));
    }

    /// Same day next month, clamped to the month's last day.
    pub fn next_month(&mut self) {
        self.select_date(self.selected_date.checked_add_months(Months::new(1)));
    }

    pub fn prev_month(&mut self) {
        self.select_date(self.selected_date.checked_sub_months(Months::new(1)));
    }

    pub fn go_to_today(&mut self, today: NaiveDate) {
        self.today = today;
        self.select_date(Some(today));
    }

    fn select_date(&mut self, date: Option<NaiveDate>) {
        if let Some(date) = date {
            self.selected_date = date;
            self.day_cursor = 0;
        }
    }

    pub fn cursor_down(&mut self) {
        let count = self.day_events().len();
        if self.day_cursor + 1 < count {
            self.day_cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        self.day_cursor = self.day_cursor.saturating_sub(1);
    }

    pub fn toggle_theme(&mut self) {
        self.theme_mode = self.theme_mode.toggled();
        self.theme = Theme::for_mode(self.theme_mode, self.dark_preset.as_deref());
        self.status_message = Some(StatusMessage::info(format!("{} mode", self.theme_mode)));
    }

    // ── Grid intents ──

    /// New event on the selected date.
    pub fn open_new_event(&mut self) {
        match self.editor.on_date_click(self.selected_date) {
            Ok(_) => self.form = FormState::default(),
            Err(e) => self.status_message = Some(StatusMessage::error(e.to_string())),
        }
    }

    /// Edit the event under the day cursor.
    pub fn open_selected_event(&mut self) {
        let Some(id) = self.selected_event().map(|e| e.id.clone()) else {
            self.status_message = Some(StatusMessage::info("No event selected"));
            return;
        };
        match self.editor.on_event_click(&self.store, &id) {
            Ok(Some(_)) => self.form = FormState::default(),
            Ok(None) => {}
            Err(e) => self.status_message = Some(StatusMessage::error(e.to_string())),
        }
    }

    // ── Form intents ──

    pub fn form_tab(&mut self) {
        self.form.active_field = self.form.active_field.next();
    }

    pub fn form_backtab(&mut self) {
        self.form.active_field = self.form.active_field.prev();
    }

    pub fn form_input_char(&mut self, c: char) {
        self.edit_active_field(|value| value.push(c));
    }

    pub fn form_backspace(&mut self) {
        self.edit_active_field(|value| {
            value.pop();
        });
    }

    fn edit_active_field(&mut self, edit: impl FnOnce(&mut String)) {
        let field = self.form.active_field;
        let Some(mut value) = self.editor.draft().map(|d| d.field(field).to_string()) else {
            return;
        };
        edit(&mut value);
        if let Err(e) = self.editor.update_field(field, value) {
            self.status_message = Some(StatusMessage::error(e.to_string()));
        }
    }

    pub fn set_form_field(&mut self, field: DraftField, value: &str) {
        if let Err(e) = self.editor.update_field(field, value) {
            self.status_message = Some(StatusMessage::error(e.to_string()));
        }
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.editor.draft()
    }

    pub fn submit_form(&mut self) {
        match self.editor.submit(&mut self.store) {
            Ok(saved) if !saved.applied => {
                self.status_message = Some(StatusMessage::error(format!(
                    "Event \"{}\" was deleted elsewhere, changes dropped",
                    saved.event.title
                )));
            }
            Ok(saved) => {
                let verb = if saved.created { "added" } else { "updated" };
                self.status_message = Some(match &saved.outcome.warning {
                    Some(w) => warning_message(w),
                    None => StatusMessage::info(format!("Event \"{}\" {verb}", saved.event.title)),
                });
                self.select_date(Some(saved.event.start.date()));
                let pos = self.day_events().iter().position(|e| e.id == saved.event.id);
                self.day_cursor = pos.unwrap_or(0);
            }
            Err(e) => self.status_message = Some(StatusMessage::error(e.to_string())),
        }
    }

    pub fn delete_form_event(&mut self) {
        match self.editor.delete_current(&mut self.store) {
            Ok(outcome) => {
                self.status_message = Some(match &outcome.warning {
                    Some(w) => warning_message(w),
                    None => StatusMessage::info("Event deleted"),
                });
                let count = self.day_events().len();
                self.day_cursor = self.day_cursor.min(count.saturating_sub(1));
            }
            Err(e) => self.status_message = Some(StatusMessage::error(e.to_string())),
        }
    }

    pub fn close_event_form(&mut self) {
        if self.editor.cancel().is_ok() {
            self.form = FormState::default();
        }
    }
}

fn warning_message(warning: &PersistenceWarning) -> StatusMessage {
    StatusMessage::error(warning.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::event::parse_date;
    use crate::calendar::store::MemoryStorage;
    use rstest::{fixture, rstest};

    const SLOT: &str = "calendarEvents";

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[fixture]
    fn app() -> App<MemoryStorage> {
        App::new(
            EventStore::new(MemoryStorage::new(), SLOT),
            &Config::default(),
            date("2025-06-10"),
        )
    }

    fn type_text(app: &mut App<MemoryStorage>, text: &str) {
        for c in text.chars() {
            app.form_input_char(c);
        }
    }

    /// Title, then tab to start time, then tab twice to end time.
    fn create_via_keys(app: &mut App<MemoryStorage>, title: &str, start: &str, end: &str) {
        app.open_new_event();
        type_text(app, title);
        app.form_tab();
        app.form_tab();
        type_text(app, start);
        app.form_tab();
        app.form_tab();
        type_text(app, end);
        app.submit_form();
    }

    #[rstest]
    fn typing_into_the_form_creates_an_event(mut app: App<MemoryStorage>) {
        create_via_keys(&mut app, "Meeting", "09:00", "10:00");
        assert_eq!(app.input_mode(), InputMode::Normal);
        let day = app.day_events();
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].title, "Meeting");
        assert_eq!(day[0].duration_display(), "09:00 - 10:00");
        assert!(app.status_message.as_ref().is_some_and(|m| !m.is_error));
    }

    #[rstest]
    fn editing_an_event_removed_underneath_does_not_restore_it(mut app: App<MemoryStorage>) {
        create_via_keys(&mut app, "Meeting", "09:00", "10:00");
        app.open_selected_event();
        let id = app.day_events()[0].id.clone();
        app.store.remove(&id);
        type_text(&mut app, "!");
        app.submit_form();
        assert_eq!(app.input_mode(), InputMode::Normal);
        assert!(app.events().is_empty());
        assert!(app.status_message.as_ref().is_some_and(|m| m.is_error));
    }

    #[rstest]
    fn backspace_edits_the_active_field(mut app: App<MemoryStorage>) {
        app.open_new_event();
        type_text(&mut app, "Lunchh");
        app.form_backspace();
        assert_eq!(app.draft().map(|d| d.title.as_str()), Some("Lunch"));
    }

    #[rstest]
    fn validation_error_keeps_form_open(mut app: App<MemoryStorage>) {
        app.open_new_event();
        app.submit_form();
        assert_eq!(app.input_mode(), InputMode::Form);
        let msg = app.status_message.clone().unwrap();
        assert!(msg.is_error);
        assert!(msg.text.contains("title"));
    }

    #[rstest]
    fn selected_event_opens_for_editing_and_deletes(mut app: App<MemoryStorage>) {
        create_via_keys(&mut app, "Early", "08:00", "09:00");
        create_via_keys(&mut app, "Late", "17:00", "18:00");
        app.day_cursor = 0;
        app.cursor_down();
        assert_eq!(app.selected_event().map(|e| e.title.as_str()), Some("Late"));

        app.open_selected_event();
        assert!(app.session().and_then(|s| s.target_id()).is_some());
        app.delete_form_event();

        assert_eq!(app.input_mode(), InputMode::Normal);
        let titles: Vec<_> = app.day_events().iter().map(|e| e.title.clone()).collect();
        assert_eq!(titles, ["Early"]);
        assert_eq!(app.day_cursor, 0);
    }

    #[rstest]
    fn write_failure_is_shown_but_event_kept(mut app: App<MemoryStorage>) {
        app.store.storage_mut().toggle_offline();
        create_via_keys(&mut app, "Offline", "09:00", "10:00");
        assert_eq!(app.day_events().len(), 1);
        assert!(app.status_message.as_ref().is_some_and(|m| m.is_error));
    }

    #[test]
    fn corrupt_storage_starts_empty_with_warning() {
        let app = App::new(
            EventStore::new(MemoryStorage::with_slot(SLOT, "{{{"), SLOT),
            &Config::default(),
            date("2025-06-10"),
        );
        assert!(app.events().is_empty());
        assert!(app.status_message.is_some_and(|m| m.is_error));
    }

    #[rstest]
    fn cancel_closes_without_saving(mut app: App<MemoryStorage>) {
        app.open_new_event();
        type_text(&mut app, "Draft only");
        app.close_event_form();
        assert_eq!(app.input_mode(), InputMode::Normal);
        assert!(app.events().is_empty());
    }

    #[rstest]
    fn month_navigation_clamps_day(mut app: App<MemoryStorage>) {
        app.go_to_today(date("2025-01-31"));
        app.next_month();
        assert_eq!(app.selected_date, date("2025-02-28"));
        app.prev_month();
        assert_eq!(app.selected_date, date("2025-01-28"));
    }

    #[rstest]
    fn week_starts_on_sunday(mut app: App<MemoryStorage>) {
        // 2025-06-10 is a Tuesday
        assert_eq!(app.week_start(), date("2025-06-08"));
        app.next_week();
        assert_eq!(app.week_start(), date("2025-06-15"));
    }

    #[rstest]
    fn multi_day_event_marks_each_day(mut app: App<MemoryStorage>) {
        app.open_new_event();
        app.set_form_field(DraftField::Title, "Trip");
        app.set_form_field(DraftField::StartTime, "08:00");
        app.set_form_field(DraftField::EndDate, "2025-06-12");
        app.set_form_field(DraftField::EndTime, "20:00");
        app.submit_form();
        let days = app.days_with_events();
        assert_eq!(days, HashSet::from([10, 11, 12]));
    }

    #[rstest]
    fn theme_toggle_switches_palette(mut app: App<MemoryStorage>) {
        app.toggle_theme();
        assert_eq!(app.theme_mode, ThemeMode::Light);
        assert_eq!(app.theme.name, "light");
    }
}
