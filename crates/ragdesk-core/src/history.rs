//! Generation history: a bounded, most-recent-first log persisted into one string slot.
//!
//! The slot holds a JSON array of [`HistoryItem`] under [`HISTORY_KEY`]. Every operation
//! is a synchronous read-modify-write of that single value; there is no locking across
//! processes, so two writers racing on the same slot resolve as last-write-wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

use crate::fallback::random_base36;

/// Fixed key of the persisted history slot.
pub const HISTORY_KEY: &str = "ai-agent-history";
/// Maximum number of entries kept; older ones are evicted on append.
pub const HISTORY_LIMIT: usize = 50;

const HISTORY_DEFAULT_PATH: &str = "./data/ragdesk_history";

/// One prompt/response pair. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub prompt: String,
    pub response: String,
    /// Stored as an RFC 3339 string.
    pub timestamp: DateTime<Utc>,
}

impl HistoryItem {
    /// New item stamped with the current time and a fresh `gen_<millis>_<rand>` id.
    pub fn new(prompt: impl Into<String>, response: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("gen_{}_{}", now.timestamp_millis(), random_base36(9)),
            prompt: prompt.into(),
            response: response.into(),
            timestamp: now,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history slot: {0}")]
    Sled(#[from] sled::Error),
    #[error("history encode: {0}")]
    Json(#[from] serde_json::Error),
    #[error("history slot is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("history slot lock poisoned")]
    Poisoned,
}

/// A single durable string cell.
pub trait HistorySlot: Send + Sync {
    fn read(&self) -> Result<Option<String>, HistoryError>;
    fn write(&self, value: &str) -> Result<(), HistoryError>;
    fn clear(&self) -> Result<(), HistoryError>;
}

/// Interface the forms depend on; swap in any store for tests or remote persistence.
pub trait HistoryStore: Send + Sync {
    /// All entries, newest first. A slot that is not a JSON array yields an empty list;
    /// individual entries that fail to parse are skipped and dropped on the next write.
    fn load(&self) -> Vec<HistoryItem>;
    /// Insert at the head and evict beyond [`HISTORY_LIMIT`]. Returns the new contents.
    fn append(&self, item: HistoryItem) -> Result<Vec<HistoryItem>, HistoryError>;
    /// Delete the entry with `id`; absent ids leave the slot untouched. Returns the new contents.
    fn remove(&self, id: &str) -> Result<Vec<HistoryItem>, HistoryError>;
    fn clear(&self) -> Result<(), HistoryError>;
}

/// [`HistoryStore`] over any [`HistorySlot`].
pub struct SlotHistory<S: HistorySlot> {
    slot: S,
}

impl<S: HistorySlot> SlotHistory<S> {
    pub fn new(slot: S) -> Self {
        Self { slot }
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    fn persist(&self, items: &[HistoryItem]) -> Result<(), HistoryError> {
        let encoded = serde_json::to_string(items)?;
        self.slot.write(&encoded)
    }
}

impl<S: HistorySlot> HistoryStore for SlotHistory<S> {
    fn load(&self) -> Vec<HistoryItem> {
        let raw = match self.slot.read() {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::error!("Error loading history: {}", e);
                return Vec::new();
            }
        };
        let entries = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("Error loading history: {}", e);
                return Vec::new();
            }
        };
        entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<HistoryItem>(entry) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!("Skipping unreadable history entry: {}", e);
                    None
                }
            })
            .collect()
    }

    fn append(&self, item: HistoryItem) -> Result<Vec<HistoryItem>, HistoryError> {
        let mut items = self.load();
        items.retain(|existing| existing.id != item.id);
        items.insert(0, item);
        items.truncate(HISTORY_LIMIT);
        self.persist(&items)?;
        Ok(items)
    }

    fn remove(&self, id: &str) -> Result<Vec<HistoryItem>, HistoryError> {
        let mut items = self.load();
        if let Some(pos) = items.iter().position(|item| item.id == id) {
            items.remove(pos);
            self.persist(&items)?;
        }
        Ok(items)
    }

    fn clear(&self) -> Result<(), HistoryError> {
        self.slot.clear()
    }
}

/// Sled-backed slot. One tree entry at `key` holds the whole serialized history.
pub struct SledSlot {
    db: sled::Db,
    key: String,
}

impl SledSlot {
    /// Open (or create) the slot database at `path`, defaulting to `./data/ragdesk_history`.
    pub fn open(path: Option<impl AsRef<Path>>) -> Result<Self, HistoryError> {
        let p = path
            .map(|x| x.as_ref().to_path_buf())
            .unwrap_or_else(|| Path::new(HISTORY_DEFAULT_PATH).to_path_buf());
        Ok(Self::from_db(sled::open(p)?))
    }

    /// Slot over an already opened database. Clones of a `sled::Db` share one store.
    pub fn from_db(db: sled::Db) -> Self {
        Self {
            db,
            key: HISTORY_KEY.to_string(),
        }
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.key = key.to_string();
        self
    }
}

impl HistorySlot for SledSlot {
    fn read(&self) -> Result<Option<String>, HistoryError> {
        match self.db.get(self.key.as_bytes())? {
            Some(v) => Ok(Some(String::from_utf8(v.to_vec())?)),
            None => Ok(None),
        }
    }

    fn write(&self, value: &str) -> Result<(), HistoryError> {
        self.db.insert(self.key.as_bytes(), value.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }

    fn clear(&self) -> Result<(), HistoryError> {
        self.db.remove(self.key.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }
}

/// In-process slot for tests and throwaway sessions.
#[derive(Default)]
pub struct MemorySlot {
    value: Mutex<Option<String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with raw contents (which need not be valid history JSON).
    pub fn with_contents(raw: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(raw.into())),
        }
    }
}

impl HistorySlot for MemorySlot {
    fn read(&self) -> Result<Option<String>, HistoryError> {
        let guard = self.value.lock().map_err(|_| HistoryError::Poisoned)?;
        Ok(guard.clone())
    }

    fn write(&self, value: &str) -> Result<(), HistoryError> {
        let mut guard = self.value.lock().map_err(|_| HistoryError::Poisoned)?;
        *guard = Some(value.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), HistoryError> {
        let mut guard = self.value.lock().map_err(|_| HistoryError::Poisoned)?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_history() -> SlotHistory<MemorySlot> {
        SlotHistory::new(MemorySlot::new())
    }

    fn item(n: usize) -> HistoryItem {
        HistoryItem {
            id: format!("gen_{}", n),
            prompt: format!("prompt {}", n),
            response: format!("response {}", n),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn append_prepends_newest() {
        let store = memory_history();
        store.append(item(1)).unwrap();
        let items = store.append(item(2)).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "gen_2");
        assert_eq!(items[1].id, "gen_1");
        assert_eq!(store.load(), items);
    }

    #[test]
    fn append_at_capacity_evicts_oldest() {
        let store = memory_history();
        for n in 0..HISTORY_LIMIT {
            store.append(item(n)).unwrap();
        }
        assert_eq!(store.load().len(), HISTORY_LIMIT);

        let items = store.append(item(999)).unwrap();
        assert_eq!(items.len(), HISTORY_LIMIT);
        assert_eq!(items[0].id, "gen_999");
        assert!(items.iter().all(|i| i.id != "gen_0"), "oldest entry should be evicted");
        assert_eq!(items[HISTORY_LIMIT - 1].id, "gen_1");
    }

    #[test]
    fn clear_then_load_is_empty() {
        let store = memory_history();
        store.append(item(1)).unwrap();
        store.append(item(2)).unwrap();
        store.clear().unwrap();
        assert!(store.load().is_empty());
        assert_eq!(store.slot().read().unwrap(), None);
    }

    #[test]
    fn remove_absent_id_is_noop() {
        let store = memory_history();
        store.append(item(1)).unwrap();
        let before = store.slot().read().unwrap();

        let items = store.remove("gen_missing").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(store.slot().read().unwrap(), before);
    }

    #[test]
    fn remove_deletes_exactly_one() {
        let store = memory_history();
        for n in 0..3 {
            store.append(item(n)).unwrap();
        }
        let items = store.remove("gen_1").unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["gen_2", "gen_0"]);
        assert_eq!(store.load().len(), 2);
    }

    #[test]
    fn append_with_duplicate_id_keeps_ids_unique() {
        let store = memory_history();
        store.append(item(1)).unwrap();
        store.append(item(2)).unwrap();
        let items = store.append(item(1)).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "gen_1");
    }

    #[test]
    fn malformed_slot_loads_empty() {
        let store = SlotHistory::new(MemorySlot::with_contents("{not json"));
        assert!(store.load().is_empty());

        let store = SlotHistory::new(MemorySlot::with_contents(r#"{"id":"a"}"#));
        assert!(store.load().is_empty());
    }

    #[test]
    fn unreadable_entries_are_skipped_not_the_whole_list() {
        let store = SlotHistory::new(MemorySlot::with_contents(
            r#"[
                {"id":"a","prompt":"p","response":"r","timestamp":"yesterday"},
                {"id":"b","prompt":"kept","response":"r","timestamp":"2024-03-01T10:15:30.123Z"},
                42
            ]"#,
        ));
        let items = store.load();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "b");

        let items = store.append(item(1)).unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["gen_1", "b"]);
    }

    #[test]
    fn append_over_malformed_slot_starts_fresh() {
        let store = SlotHistory::new(MemorySlot::with_contents("garbage"));
        let items = store.append(item(7)).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(store.load()[0].id, "gen_7");
    }

    #[test]
    fn stored_timestamps_are_iso_strings() {
        let store = memory_history();
        store.append(item(1)).unwrap();
        let raw = store.slot().read().unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let ts = json[0]["timestamp"].as_str().expect("timestamp should be a string");
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }

    #[test]
    fn loads_items_written_by_other_clients() {
        let store = SlotHistory::new(MemorySlot::with_contents(
            r#"[{"id":"gen_1700000000000_abc123def","prompt":"hi","response":"hello","timestamp":"2024-03-01T10:15:30.123Z"}]"#,
        ));
        let items = store.load();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].prompt, "hi");
        assert_eq!(items[0].timestamp.timestamp_millis(), 1_709_288_130_123);
    }

    #[test]
    fn new_item_ids_have_expected_shape() {
        let a = HistoryItem::new("p", "r");
        let b = HistoryItem::new("p", "r");
        assert_ne!(a.id, b.id);
        let parts: Vec<&str> = a.id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "gen");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
    }

    #[test]
    fn sled_slot_persists_through_shared_db() {
        let dir = tempfile::tempdir().unwrap();
        let db = sled::open(dir.path()).unwrap();
        {
            let store = SlotHistory::new(SledSlot::from_db(db.clone()));
            store.append(item(1)).unwrap();
            store.append(item(2)).unwrap();
        }
        db.flush().unwrap();

        let store = SlotHistory::new(SledSlot::from_db(db.clone()));
        let items = store.load();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "gen_2");

        store.clear().unwrap();
        assert!(store.load().is_empty());
        assert_eq!(db.get(HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn sled_slot_open_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let slot = SledSlot::open(Some(dir.path().join("history"))).unwrap();
        slot.write("[]").unwrap();
        assert_eq!(slot.read().unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn sled_slot_keys_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let db = sled::open(dir.path()).unwrap();
        let other = SledSlot::from_db(db.clone()).with_key("other-history");
        other.write("[]").unwrap();
        assert_eq!(other.read().unwrap().as_deref(), Some("[]"));

        let default_slot = SledSlot::from_db(db);
        assert_eq!(default_slot.read().unwrap(), None);
    }
}
