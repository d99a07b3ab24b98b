#[cfg(test)]
use std::collections::HashMap;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::PathBuf;

use super::error::PersistenceWarning;
use super::event::Event;

/// A place that holds named string slots, like browser local storage.
pub trait Storage {
    /// `Ok(None)` when the slot has never been written.
    fn read(&self, slot: &str) -> io::Result<Option<String>>;

    /// Replaces the slot's whole content. Must leave either the old or
    /// the new value behind, never a mix.
    fn write(&mut self, slot: &str, value: &str) -> io::Result<()>;
}

/// One JSON file per slot inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{slot}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, slot: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.slot_path(slot)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, slot: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.slot_path(slot);
        let tmp = self.dir.join(format!(".{slot}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)
    }
}

/// Slots kept in a map. Can be told to fail every read and write.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    slots: HashMap<String, String>,
    offline: bool,
}

#[cfg(test)]
impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(slot: &str, value: &str) -> Self {
        let mut storage = Self::default();
        storage.slots.insert(slot.to_string(), value.to_string());
        storage
    }

    pub fn slot(&self, slot: &str) -> Option<&str> {
        self.slots.get(slot).map(String::as_str)
    }

    pub fn toggle_offline(&mut self) {
        self.offline = !self.offline;
    }
}

#[cfg(test)]
impl Storage for MemoryStorage {
    fn read(&self, slot: &str) -> io::Result<Option<String>> {
        if self.offline {
            return Err(io::Error::other("storage offline"));
        }
        Ok(self.slots.get(slot).cloned())
    }

    fn write(&mut self, slot: &str, value: &str) -> io::Result<()> {
        if self.offline {
            return Err(io::Error::other("storage offline"));
        }
        self.slots.insert(slot.to_string(), value.to_string());
        Ok(())
    }
}

/// The collection after a store operation, plus any storage problem
/// hit along the way.
#[derive(Debug)]
pub struct StoreOutcome {
    pub events: Vec<Event>,
    pub warning: Option<PersistenceWarning>,
}

/// Owns the event collection and writes it through to a storage slot
/// on every change.
pub struct EventStore<S: Storage> {
    storage: S,
    slot: String,
    events: Vec<Event>,
}

impl<S: Storage> EventStore<S> {
    pub fn new(storage: S, slot: impl Into<String>) -> Self {
        Self {
            storage,
            slot: slot.into(),
            events: Vec::new(),
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Replace the in-memory collection with what the slot holds. A
    /// missing slot or content that is not a JSON array yields an empty
    /// collection; records that fail to decode are dropped one by one.
    pub fn load_all(&mut self) -> StoreOutcome {
        let (events, warning) = match self.storage.read(&self.slot) {
            Ok(None) => (Vec::new(), None),
            Ok(Some(content)) => match serde_json::from_str::<Vec<serde_json::Value>>(&content) {
                Ok(records) => {
                    let (events, skipped) = decode_records(records);
                    let warning = (skipped > 0).then(|| PersistenceWarning::Skipped {
                        slot: self.slot.clone(),
                        count: skipped,
                    });
                    (dedup_ids(events), warning)
                }
                Err(source) => (
                    Vec::new(),
                    Some(PersistenceWarning::Corrupt {
                        slot: self.slot.clone(),
                        source,
                    }),
                ),
            },
            Err(source) => (
                Vec::new(),
                Some(PersistenceWarning::Read {
                    slot: self.slot.clone(),
                    source,
                }),
            ),
        };

        match &warning {
            Some(w) => tracing::warn!(slot = %self.slot, "{w}"),
            None => tracing::info!(slot = %self.slot, count = events.len(), "loaded events"),
        }

        self.events = events;
        self.outcome(warning)
    }

    /// Insert `event`, or replace the one with the same id in place.
    pub fn upsert(&mut self, event: Event) -> StoreOutcome {
        let id = event.id.clone();
        match self.events.iter_mut().find(|e| e.id == event.id) {
            Some(existing) => *existing = event,
            None => self.events.push(event),
        }
        tracing::info!(%id, count = self.events.len(), "upserted event");

        let warning = self.persist();
        self.outcome(warning)
    }

    /// Drop the event with `id`. An unknown id leaves everything as is.
    pub fn remove(&mut self, id: &str) -> StoreOutcome {
        let before = self.events.len();
        self.events.retain(|e| e.id != id);
        if self.events.len() == before {
            tracing::debug!(%id, "remove: no such event");
        } else {
            tracing::info!(%id, count = self.events.len(), "removed event");
        }

        let warning = self.persist();
        self.outcome(warning)
    }

    /// The collection as it stands, without touching storage.
    pub fn snapshot(&self) -> StoreOutcome {
        self.outcome(None)
    }

    fn persist(&mut self) -> Option<PersistenceWarning> {
        let encoded = match serde_json::to_string(&self.events) {
            Ok(encoded) => encoded,
            Err(source) => {
                return Some(self.warn(PersistenceWarning::Encode {
                    slot: self.slot.clone(),
                    source,
                }));
            }
        };

        match self.storage.write(&self.slot, &encoded) {
            Ok(()) => None,
            Err(source) => Some(self.warn(PersistenceWarning::Write {
                slot: self.slot.clone(),
                source,
            })),
        }
    }

    fn warn(&self, warning: PersistenceWarning) -> PersistenceWarning {
        tracing::warn!(slot = %self.slot, "{warning}");
        warning
    }

    fn outcome(&self, warning: Option<PersistenceWarning>) -> StoreOutcome {
        StoreOutcome {
            events: self.events.clone(),
            warning,
        }
    }
}

fn decode_records(records: Vec<serde_json::Value>) -> (Vec<Event>, usize) {
    let mut skipped = 0;
    let events = records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<Event>(record) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!(error = %e, "dropping unreadable stored event");
                skipped += 1;
                None
            }
        })
        .collect();
    (events, skipped)
}

/// Keep the first record for each id.
fn dedup_ids(events: Vec<Event>) -> Vec<Event> {
    let mut seen = HashSet::new();
    events
        .into_iter()
        .filter(|e| {
            let fresh = seen.insert(e.id.clone());
            if !fresh {
                tracing::warn!(id = %e.id, "dropping stored event with duplicate id");
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::event::{parse_datetime, EventColor};
    use rstest::{fixture, rstest};
    use serde_json::json;

    const SLOT: &str = "calendarEvents";

    fn event(id: &str, title: &str) -> Event {
        Event {
            id: id.to_string(),
            title: title.to_string(),
            start: parse_datetime("2025-06-10T09:00").unwrap(),
            end: parse_datetime("2025-06-10T10:00").unwrap(),
            color: EventColor::default(),
            image: None,
        }
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[fixture]
    fn store() -> EventStore<MemoryStorage> {
        let mut store = EventStore::new(MemoryStorage::new(), SLOT);
        store.load_all();
        store
    }

    #[rstest]
    fn load_all_without_slot_is_empty(mut store: EventStore<MemoryStorage>) {
        let outcome = store.load_all();
        assert!(outcome.events.is_empty());
        assert!(outcome.warning.is_none());
    }

    #[rstest]
    #[case("not json")]
    #[case("{\"id\": 1}")]
    #[case("{\"events\": []}")]
    fn load_all_with_malformed_slot_is_empty(#[case] content: &str) {
        let mut store = EventStore::new(MemoryStorage::with_slot(SLOT, content), SLOT);
        let outcome = store.load_all();
        assert!(outcome.events.is_empty());
        assert!(matches!(outcome.warning, Some(PersistenceWarning::Corrupt { .. })));
    }

    #[rstest]
    #[case(json!({"id": "2", "title": "x", "start": "soon", "end": "later"}))]
    #[case(json!({"id": "2", "title": "", "start": "2025-06-10T09:00", "end": "2025-06-10T10:00"}))]
    #[case(json!({"title": "no id"}))]
    fn load_all_drops_only_the_bad_record(#[case] bad: serde_json::Value) {
        let stored = json!([
            {"id": "1", "title": "Keep me", "start": "2025-06-10T09:00", "end": "2025-06-10T10:00"},
            bad,
        ]);
        let mut store = EventStore::new(MemoryStorage::with_slot(SLOT, &stored.to_string()), SLOT);
        let outcome = store.load_all();
        assert_eq!(ids(&outcome.events), ["1"]);
        assert!(matches!(
            outcome.warning,
            Some(PersistenceWarning::Skipped { count: 1, .. })
        ));
    }

    #[test]
    fn fractional_seconds_load_and_survive_the_next_save() {
        let stored = json!([
            {"id": "1", "title": "Keep me", "start": "2025-06-10T09:00", "end": "2025-06-10T10:00"},
            {
                "id": "2",
                "title": "Stepped",
                "start": "2025-06-11T09:00:00.000",
                "end": "2025-06-11T09:30:00.000",
            },
        ]);
        let mut store = EventStore::new(MemoryStorage::with_slot(SLOT, &stored.to_string()), SLOT);
        let outcome = store.load_all();
        assert!(outcome.warning.is_none());
        assert_eq!(ids(&outcome.events), ["1", "2"]);

        store.upsert(event("3", "new"));
        let mut reloaded = EventStore::new(store.storage().clone(), SLOT);
        assert_eq!(ids(&reloaded.load_all().events), ["1", "2", "3"]);
    }

    #[test]
    fn load_all_keeps_first_of_duplicate_ids() {
        let stored =
            serde_json::to_string(&vec![event("1", "first"), event("1", "second")]).unwrap();
        let mut store = EventStore::new(MemoryStorage::with_slot(SLOT, &stored), SLOT);
        let outcome = store.load_all();
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].title, "first");
    }

    #[rstest]
    fn upsert_inserts_then_replaces_in_place(mut store: EventStore<MemoryStorage>) {
        store.upsert(event("1", "a"));
        store.upsert(event("2", "b"));
        let outcome = store.upsert(event("1", "A"));
        assert_eq!(ids(&outcome.events), ["1", "2"]);
        assert_eq!(outcome.events[0].title, "A");
        assert!(outcome.warning.is_none());
    }

    #[rstest]
    fn ids_stay_unique_across_mutations(mut store: EventStore<MemoryStorage>) {
        for (i, id) in ["1", "2", "1", "3", "2", "2"].iter().enumerate() {
            if i % 3 == 2 {
                store.remove(id);
            } else {
                store.upsert(event(id, "x"));
            }
            let unique: HashSet<_> = ids(store.events()).into_iter().collect();
            assert_eq!(unique.len(), store.events().len());
        }
    }

    #[rstest]
    fn upsert_survives_reload(mut store: EventStore<MemoryStorage>) {
        let mut ev = event("1", "Lunch");
        ev.image = Some("file:///tmp/lunch.png".to_string());
        ev.color = EventColor::parse("#ff0000").unwrap();
        store.upsert(ev.clone());

        let storage = store.storage().clone();
        let mut reloaded = EventStore::new(storage, SLOT);
        let outcome = reloaded.load_all();
        assert_eq!(outcome.events, vec![ev]);
    }

    #[rstest]
    fn remove_absent_id_is_a_no_op(mut store: EventStore<MemoryStorage>) {
        store.upsert(event("1", "a"));
        let outcome = store.remove("missing");
        assert_eq!(ids(&outcome.events), ["1"]);
        assert!(outcome.warning.is_none());
    }

    #[rstest]
    fn remove_persists(mut store: EventStore<MemoryStorage>) {
        store.upsert(event("1", "a"));
        store.upsert(event("2", "b"));
        store.remove("1");
        let mut reloaded = EventStore::new(store.storage().clone(), SLOT);
        assert_eq!(ids(&reloaded.load_all().events), ["2"]);
    }

    #[rstest]
    fn failed_write_keeps_in_memory_update(mut store: EventStore<MemoryStorage>) {
        store.upsert(event("1", "a"));
        store.storage_mut().toggle_offline();

        let outcome = store.upsert(event("2", "b"));
        assert_eq!(ids(&outcome.events), ["1", "2"]);
        assert!(matches!(outcome.warning, Some(PersistenceWarning::Write { .. })));
        assert_eq!(ids(store.events()), ["1", "2"]);

        store.storage_mut().toggle_offline();
        assert_eq!(store.storage().slot(SLOT).map(|s| s.contains("\"2\"")), Some(false));
    }

    #[test]
    fn read_failure_is_a_warning() {
        let mut storage = MemoryStorage::new();
        storage.toggle_offline();
        let mut store = EventStore::new(storage, SLOT);
        let outcome = store.load_all();
        assert!(outcome.events.is_empty());
        assert!(matches!(outcome.warning, Some(PersistenceWarning::Read { .. })));
    }

    #[test]
    fn file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested");
        let mut store = EventStore::new(FileStorage::new(&data_dir), SLOT);
        assert!(store.load_all().events.is_empty());

        store.upsert(event("1", "a"));
        assert!(data_dir.join("calendarEvents.json").exists());
        assert!(!data_dir.join(".calendarEvents.json.tmp").exists());

        let mut reloaded = EventStore::new(FileStorage::new(&data_dir), SLOT);
        assert_eq!(ids(&reloaded.load_all().events), ["1"]);
    }

    #[test]
    fn file_storage_treats_garbage_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("calendarEvents.json"), "[{").unwrap();
        let mut store = EventStore::new(FileStorage::new(dir.path()), SLOT);
        let outcome = store.load_all();
        assert!(outcome.events.is_empty());
        assert!(outcome.warning.is_some());
    }

    #[test]
    fn file_storage_write_failure_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let mut store = EventStore::new(FileStorage::new(blocker.join("data")), SLOT);
        let outcome = store.upsert(event("1", "a"));
        assert_eq!(ids(&outcome.events), ["1"]);
        assert!(matches!(outcome.warning, Some(PersistenceWarning::Write { .. })));
    }
}
