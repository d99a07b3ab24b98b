use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;

use super::error::{EditorError, ValidationError};
use super::event::{format_date, format_time, parse_date, parse_time, Event, EventColor};
use super::store::{EventStore, Storage, StoreOutcome};

/// Editable fields of the event form, in form order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    Title,
    StartDate,
    StartTime,
    EndDate,
    EndTime,
    Color,
    Image,
}

impl DraftField {
    pub const ALL: [DraftField; 7] = [
        DraftField::Title,
        DraftField::StartDate,
        DraftField::StartTime,
        DraftField::EndDate,
        DraftField::EndTime,
        DraftField::Color,
        DraftField::Image,
    ];

    pub fn next(&self) -> Self {
        match self {
            DraftField::Title => DraftField::StartDate,
            DraftField::StartDate => DraftField::StartTime,
            DraftField::StartTime => DraftField::EndDate,
            DraftField::EndDate => DraftField::EndTime,
            DraftField::EndTime => DraftField::Color,
            DraftField::Color => DraftField::Image,
            DraftField::Image => DraftField::Title,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            DraftField::Title => DraftField::Image,
            DraftField::StartDate => DraftField::Title,
            DraftField::StartTime => DraftField::StartDate,
            DraftField::EndDate => DraftField::StartTime,
            DraftField::EndTime => DraftField::EndDate,
            DraftField::Color => DraftField::EndTime,
            DraftField::Image => DraftField::Color,
        }
    }

    /// Form name of the field, as accepted by `from_str`.
    pub fn name(&self) -> &'static str {
        match self {
            DraftField::Title => "title",
            DraftField::StartDate => "startDate",
            DraftField::StartTime => "startTime",
            DraftField::EndDate => "endDate",
            DraftField::EndTime => "endTime",
            DraftField::Color => "color",
            DraftField::Image => "image",
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DraftField::Title => "title",
            DraftField::StartDate => "start date",
            DraftField::StartTime => "start time",
            DraftField::EndDate => "end date",
            DraftField::EndTime => "end time",
            DraftField::Color => "color",
            DraftField::Image => "image",
        };
        f.write_str(label)
    }
}

impl FromStr for DraftField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DraftField::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| format!("unknown field {s:?}"))
    }
}

/// Working copy of the form. Values are kept as typed; nothing is
/// parsed until submit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Draft {
    pub title: String,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    pub color: String,
    pub image: Option<String>,
}

impl Draft {
    /// A blank draft on `date`: both dates set, times empty.
    pub fn for_date(date: NaiveDate, color: &EventColor) -> Self {
        let date = format_date(date);
        Self {
            title: String::new(),
            start_date: date.clone(),
            start_time: String::new(),
            end_date: date,
            end_time: String::new(),
            color: color.to_string(),
            image: None,
        }
    }

    pub fn from_event(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            start_date: format_date(event.start.date()),
            start_time: format_time(event.start.time()),
            end_date: format_date(event.end.date()),
            end_time: format_time(event.end.time()),
            color: event.color.to_string(),
            image: event.image.clone(),
        }
    }

    pub fn field(&self, field: DraftField) -> &str {
        match field {
            DraftField::Title => &self.title,
            DraftField::StartDate => &self.start_date,
            DraftField::StartTime => &self.start_time,
            DraftField::EndDate => &self.end_date,
            DraftField::EndTime => &self.end_time,
            DraftField::Color => &self.color,
            DraftField::Image => self.image.as_deref().unwrap_or(""),
        }
    }

    /// A copy of this draft with one field replaced. An empty image
    /// clears the reference.
    pub fn with_field(mut self, field: DraftField, value: impl Into<String>) -> Self {
        let value = value.into();
        match field {
            DraftField::Title => self.title = value,
            DraftField::StartDate => self.start_date = value,
            DraftField::StartTime => self.start_time = value,
            DraftField::EndDate => self.end_date = value,
            DraftField::EndTime => self.end_time = value,
            DraftField::Color => self.color = value,
            DraftField::Image => self.image = (!value.is_empty()).then_some(value),
        }
        self
    }

    /// Build the event this draft describes under `id`.
    pub fn to_event(&self, id: String, rules: &EditorRules) -> Result<Event, ValidationError> {
        let missing: Vec<DraftField> = [
            (DraftField::Title, &self.title),
            (DraftField::StartDate, &self.start_date),
            (DraftField::StartTime, &self.start_time),
            (DraftField::EndDate, &self.end_date),
            (DraftField::EndTime, &self.end_time),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        let start_date = parse_field(DraftField::StartDate, &self.start_date, parse_date)?;
        let start_time = parse_field(DraftField::StartTime, &self.start_time, parse_time)?;
        let end_date = parse_field(DraftField::EndDate, &self.end_date, parse_date)?;
        let end_time = parse_field(DraftField::EndTime, &self.end_time, parse_time)?;
        let color = if self.color.is_empty() {
            rules.default_color.clone()
        } else {
            parse_field(DraftField::Color, &self.color, EventColor::parse)?
        };

        let start = start_date.and_time(start_time);
        let end = end_date.and_time(end_time);
        if rules.reject_inverted_ranges && end < start {
            return Err(ValidationError::EndBeforeStart);
        }

        Ok(Event {
            id,
            title: self.title.clone(),
            start,
            end,
            color,
            image: self.image.clone(),
        })
    }
}

fn parse_field<T>(
    field: DraftField,
    value: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, ValidationError> {
    parse(value).ok_or_else(|| ValidationError::Malformed {
        field,
        value: value.to_string(),
    })
}

/// Settings that shape validation and new drafts.
#[derive(Debug, Clone, Default)]
pub struct EditorRules {
    pub default_color: EventColor,
    /// Reject events whose end is before their start. Off by default,
    /// matching the behaviour users already have stored data from.
    pub reject_inverted_ranges: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMode {
    Creating,
    Editing { target_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub mode: SessionMode,
    pub draft: Draft,
}

impl EditSession {
    pub fn target_id(&self) -> Option<&str> {
        match &self.mode {
            SessionMode::Creating => None,
            SessionMode::Editing { target_id } => Some(target_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Closed,
    Creating,
    Editing,
}

/// Ids are Unix milliseconds as decimal strings, strictly increasing
/// within a process.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn next_id(&mut self, now_ms: i64, taken: impl Fn(&str) -> bool) -> String {
        let mut candidate = now_ms.max(self.last + 1);
        while taken(&candidate.to_string()) {
            candidate += 1;
        }
        self.last = candidate;
        candidate.to_string()
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// What a successful submit produced.
#[derive(Debug)]
pub struct Saved {
    pub event: Event,
    pub created: bool,
    /// False when the edited event had already left the store, in which
    /// case nothing was written.
    pub applied: bool,
    pub outcome: StoreOutcome,
}

/// Drives the Closed / Creating / Editing state machine and hands
/// validated events to the store.
#[derive(Debug, Default)]
pub struct EventEditorController {
    session: Option<EditSession>,
    rules: EditorRules,
    ids: IdGenerator,
}

impl EventEditorController {
    pub fn new(rules: EditorRules) -> Self {
        Self {
            session: None,
            rules,
            ids: IdGenerator::default(),
        }
    }

    pub fn state(&self) -> EditorState {
        match self.session.as_ref().map(|s| &s.mode) {
            None => EditorState::Closed,
            Some(SessionMode::Creating) => EditorState::Creating,
            Some(SessionMode::Editing { .. }) => EditorState::Editing,
        }
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.session.as_ref().map(|s| &s.draft)
    }

    /// Date click: open a Creating session on `date`.
    pub fn on_date_click(&mut self, date: NaiveDate) -> Result<&Draft, EditorError> {
        if self.session.is_some() {
            return Err(EditorError::SessionOpen);
        }
        tracing::debug!(%date, "opening new event form");
        let session = self.session.insert(EditSession {
            mode: SessionMode::Creating,
            draft: Draft::for_date(date, &self.rules.default_color),
        });
        Ok(&session.draft)
    }

    /// Event click: open an Editing session for `id`. Returns `Ok(None)`
    /// and stays closed when the store has no such event.
    pub fn on_event_click<S: Storage>(
        &mut self,
        store: &EventStore<S>,
        id: &str,
    ) -> Result<Option<&Draft>, EditorError> {
        if self.session.is_some() {
            return Err(EditorError::SessionOpen);
        }
        let Some(event) = store.get(id) else {
            tracing::debug!(%id, "event click on unknown id");
            return Ok(None);
        };
        tracing::debug!(%id, "opening event form");
        let session = self.session.insert(EditSession {
            mode: SessionMode::Editing {
                target_id: event.id.clone(),
            },
            draft: Draft::from_event(event),
        });
        Ok(Some(&session.draft))
    }

    pub fn update_field(
        &mut self,
        field: DraftField,
        value: impl Into<String>,
    ) -> Result<&Draft, EditorError> {
        let session = self.session.as_mut().ok_or(EditorError::NoSession)?;
        session.draft = std::mem::take(&mut session.draft).with_field(field, value);
        Ok(&session.draft)
    }

    /// Validate the draft and write it to the store. On a validation
    /// error the session stays open with the draft untouched.
    pub fn submit<S: Storage>(&mut self, store: &mut EventStore<S>) -> Result<Saved, EditorError> {
        self.submit_at(store, now_millis())
    }

    fn submit_at<S: Storage>(
        &mut self,
        store: &mut EventStore<S>,
        now_ms: i64,
    ) -> Result<Saved, EditorError> {
        let session = self.session.as_ref().ok_or(EditorError::NoSession)?;

        let (id, created) = match &session.mode {
            SessionMode::Editing { target_id } => (target_id.clone(), false),
            SessionMode::Creating => (String::new(), true),
        };
        let mut event = session
            .draft
            .to_event(id, &self.rules)
            .inspect_err(|e| tracing::debug!(error = %e, "draft rejected"))?;
        if created {
            event.id = self.ids.next_id(now_ms, |id| store.contains(id));
        } else if !store.contains(&event.id) {
            tracing::debug!(id = %event.id, "edited event no longer stored, nothing written");
            self.session = None;
            return Ok(Saved {
                event,
                created,
                applied: false,
                outcome: store.snapshot(),
            });
        }

        let outcome = store.upsert(event.clone());
        self.session = None;
        Ok(Saved {
            event,
            created,
            applied: true,
            outcome,
        })
    }

    /// Delete the event being edited and close the session.
    pub fn delete_current<S: Storage>(
        &mut self,
        store: &mut EventStore<S>,
    ) -> Result<StoreOutcome, EditorError> {
        let session = self.session.as_ref().ok_or(EditorError::NoSession)?;
        let target_id = session.target_id().ok_or(EditorError::NotEditing)?.to_string();
        let outcome = store.remove(&target_id);
        self.session = None;
        Ok(outcome)
    }

    pub fn cancel(&mut self) -> Result<(), EditorError> {
        self.session.take().map(|_| ()).ok_or(EditorError::NoSession)
    }
}
