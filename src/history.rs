//! Verdict history: storage seam, recording and statistics

use chrono::{Local, NaiveDate, Utc};
use log::debug;
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db;
use crate::models::{CalorieValue, HistoryEntry, Product, Stats, Verdict};

/// Key the whole history collection is stored under
pub const HISTORY_KEY: &str = "isitworthit_history";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("stored history is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Owner of the persisted history collection, most recent entry first
pub trait HistoryStore {
    fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError>;

    /// Put `entry` at the front of the collection
    fn append(&mut self, entry: HistoryEntry) -> Result<(), HistoryError>;

    /// Drop the entry with `id` and return what is left. Unknown ids are a no-op.
    fn remove(&mut self, id: Uuid) -> Result<Vec<HistoryEntry>, HistoryError>;

    fn clear(&mut self) -> Result<(), HistoryError>;
}

/// History kept as one JSON array in the SQLite key-value table
pub struct SqliteHistoryStore {
    conn: Connection,
}

impl SqliteHistoryStore {
    /// Takes an open connection; the schema is created if missing
    pub fn new(conn: Connection) -> Result<Self, HistoryError> {
        db::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn save(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let json = serde_json::to_string(entries)?;
        db::set_value(&self.conn, HISTORY_KEY, &json)?;
        Ok(())
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        match db::get_value(&self.conn, HISTORY_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn append(&mut self, entry: HistoryEntry) -> Result<(), HistoryError> {
        let mut entries = self.load()?;
        entries.insert(0, entry);
        self.save(&entries)
    }

    fn remove(&mut self, id: Uuid) -> Result<Vec<HistoryEntry>, HistoryError> {
        let mut entries = self.load()?;
        entries.retain(|e| e.id != id);
        self.save(&entries)?;
        Ok(entries)
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        db::delete_value(&self.conn, HISTORY_KEY)?;
        Ok(())
    }
}

/// Non-persistent store
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: Vec<HistoryEntry>,
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        Ok(self.entries.clone())
    }

    fn append(&mut self, entry: HistoryEntry) -> Result<(), HistoryError> {
        self.entries.insert(0, entry);
        Ok(())
    }

    fn remove(&mut self, id: Uuid) -> Result<Vec<HistoryEntry>, HistoryError> {
        self.entries.retain(|e| e.id != id);
        Ok(self.entries.clone())
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        self.entries.clear();
        Ok(())
    }
}

/// Record the user's verdict on a product with a known energy value
pub fn record_verdict<S: HistoryStore + ?Sized>(
    store: &mut S,
    product: Product,
    verdict: Verdict,
    calories: CalorieValue,
) -> Result<HistoryEntry, HistoryError> {
    let entry = HistoryEntry {
        id: Uuid::new_v4(),
        product,
        date: Utc::now(),
        verdict,
        calories,
    };
    store.append(entry.clone())?;
    debug!("Recorded '{}' for {}", entry.verdict, entry.product.code);
    Ok(entry)
}

/// Statistics over the whole history, with "today" taken from the local clock
pub fn get_stats<S: HistoryStore + ?Sized>(store: &S) -> Result<Stats, HistoryError> {
    let entries = store.load()?;
    Ok(compute_stats(&entries, Local::now().date_naive()))
}

/// Statistics over `entries`; only entries dated `today` (local time) count
/// towards the calories still to burn
pub fn compute_stats(entries: &[HistoryEntry], today: NaiveDate) -> Stats {
    let total = entries.len();
    let worth_it = entries
        .iter()
        .filter(|e| e.verdict == Verdict::WorthIt)
        .count();
    let not_worth_it = entries
        .iter()
        .filter(|e| e.verdict == Verdict::NotWorthIt)
        .count();

    let calories_to_burn_today = entries
        .iter()
        .filter(|e| e.date.with_timezone(&Local).date_naive() == today)
        .map(|e| e.calories.kcal())
        .sum();

    Stats {
        total,
        worth_it,
        not_worth_it,
        worth_it_percentage: percentage(worth_it, total),
        not_worth_it_percentage: percentage(not_worth_it, total),
        calories_to_burn_today,
    }
}

fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u32
}
