//! Notification persistence.
//!
//! [`SqliteStore`] keeps one row per notification in a single SQLite file.
//! Every operation is one SQL statement, so each insert or status change is
//! atomic on its own; concurrent callers are serialized on the connection
//! mutex. Timestamps are stored as fixed-width ISO-8601 UTC strings so that
//! string comparison orders them chronologically.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

use crate::scheduler::record::{NewNotification, NotificationRecord, NotificationStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("notification not found: {0}")]
    NotFound(i64),
    #[error("notification {id} is {status}, not pending")]
    InvalidTransition {
        id: i64,
        status: NotificationStatus,
    },
    #[error("corrupt notification row {id}: {message}")]
    Corrupt { id: i64, message: String },
}

/// Persistence contract for notification records.
pub trait NotificationStore: Send + Sync {
    fn insert(&self, notification: &NewNotification) -> Result<i64, StoreError>;

    /// Records in `status` whose `notify_at_utc` is at or before `due_by`,
    /// oldest first.
    fn query(
        &self,
        status: NotificationStatus,
        due_by: DateTime<Utc>,
    ) -> Result<Vec<NotificationRecord>, StoreError>;

    /// Move a pending record to a terminal status.
    fn update_status(
        &self,
        id: i64,
        status: NotificationStatus,
        last_error: Option<&str>,
    ) -> Result<(), StoreError>;

    fn get(&self, id: i64) -> Result<NotificationRecord, StoreError>;
}

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS notifications (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    email                TEXT NOT NULL,
    latitude             REAL NOT NULL,
    longitude            REAL NOT NULL,
    timezone_label       TEXT NOT NULL,
    rise_time_utc        TEXT NOT NULL,
    culmination_time_utc TEXT NOT NULL,
    set_time_utc         TEXT NOT NULL,
    max_elevation_deg    REAL NOT NULL,
    notify_at_utc        TEXT NOT NULL,
    status               TEXT NOT NULL DEFAULT 'pending',
    created_at_utc       TEXT NOT NULL,
    last_error           TEXT
);

CREATE INDEX IF NOT EXISTS idx_notifications_due ON notifications(status, notify_at_utc);
"#;

const SELECT_COLUMNS: &str = "SELECT id, email, latitude, longitude, timezone_label, \
     rise_time_utc, culmination_time_utc, set_time_utc, max_elevation_deg, \
     notify_at_utc, status, created_at_utc, last_error FROM notifications";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Each operation is a single statement, so a panic in another holder
    /// cannot leave the connection mid-transaction.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl NotificationStore for SqliteStore {
    fn insert(&self, n: &NewNotification) -> Result<i64, StoreError> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO notifications (email, latitude, longitude, timezone_label, \
             rise_time_utc, culmination_time_utc, set_time_utc, max_elevation_deg, \
             notify_at_utc, status, created_at_utc, last_error) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, NULL)",
            params![
                n.email,
                n.latitude,
                n.longitude,
                n.timezone_label,
                format_ts(n.rise_time_utc),
                format_ts(n.culmination_time_utc),
                format_ts(n.set_time_utc),
                n.max_elevation_deg,
                format_ts(n.notify_at_utc),
                NotificationStatus::Pending.as_ref(),
                format_ts(n.created_at_utc),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn query(
        &self,
        status: NotificationStatus,
        due_by: DateTime<Utc>,
    ) -> Result<Vec<NotificationRecord>, StoreError> {
        let conn = self.lock();
        let sql = format!(
            "{} WHERE status = ?1 AND notify_at_utc <= ?2 ORDER BY notify_at_utc, id",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![status.as_ref(), format_ts(due_by)], read_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }

    fn update_status(
        &self,
        id: i64,
        status: NotificationStatus,
        last_error: Option<&str>,
    ) -> Result<(), StoreError> {
        let conn = self.lock();
        if !status.is_terminal() {
            let current = current_status(&conn, id)?;
            return Err(StoreError::InvalidTransition {
                id,
                status: current,
            });
        }

        let changed = conn.execute(
            "UPDATE notifications SET status = ?1, last_error = ?2 \
             WHERE id = ?3 AND status = ?4",
            params![
                status.as_ref(),
                last_error,
                id,
                NotificationStatus::Pending.as_ref()
            ],
        )?;
        if changed == 0 {
            let current = current_status(&conn, id)?;
            return Err(StoreError::InvalidTransition {
                id,
                status: current,
            });
        }
        Ok(())
    }

    fn get(&self, id: i64) -> Result<NotificationRecord, StoreError> {
        let conn = self.lock();
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        conn.query_row(&sql, params![id], read_row)
            .optional()?
            .ok_or(StoreError::NotFound(id))?
            .into_record()
    }
}

fn current_status(conn: &Connection, id: i64) -> Result<NotificationStatus, StoreError> {
    let status: Option<String> = conn
        .query_row(
            "SELECT status FROM notifications WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    let status = status.ok_or(StoreError::NotFound(id))?;
    status.parse().map_err(|_| StoreError::Corrupt {
        id,
        message: format!("unknown status '{}'", status),
    })
}

pub fn format_ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Row as stored, before timestamp and status parsing.
struct StoredRow {
    id: i64,
    email: String,
    latitude: f64,
    longitude: f64,
    timezone_label: String,
    rise_time_utc: String,
    culmination_time_utc: String,
    set_time_utc: String,
    max_elevation_deg: f64,
    notify_at_utc: String,
    status: String,
    created_at_utc: String,
    last_error: Option<String>,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredRow> {
    Ok(StoredRow {
        id: row.get(0)?,
        email: row.get(1)?,
        latitude: row.get(2)?,
        longitude: row.get(3)?,
        timezone_label: row.get(4)?,
        rise_time_utc: row.get(5)?,
        culmination_time_utc: row.get(6)?,
        set_time_utc: row.get(7)?,
        max_elevation_deg: row.get(8)?,
        notify_at_utc: row.get(9)?,
        status: row.get(10)?,
        created_at_utc: row.get(11)?,
        last_error: row.get(12)?,
    })
}

impl StoredRow {
    fn into_record(self) -> Result<NotificationRecord, StoreError> {
        let id = self.id;
        let ts = |value: &str| {
            DateTime::parse_from_rfc3339(value)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| StoreError::Corrupt {
                    id,
                    message: format!("bad timestamp '{}': {}", value, e),
                })
        };
        let status: NotificationStatus = self.status.parse().map_err(|_| StoreError::Corrupt {
            id,
            message: format!("unknown status '{}'", self.status),
        })?;

        Ok(NotificationRecord {
            id,
            rise_time_utc: ts(&self.rise_time_utc)?,
            culmination_time_utc: ts(&self.culmination_time_utc)?,
            set_time_utc: ts(&self.set_time_utc)?,
            notify_at_utc: ts(&self.notify_at_utc)?,
            created_at_utc: ts(&self.created_at_utc)?,
            email: self.email,
            latitude: self.latitude,
            longitude: self.longitude,
            timezone_label: self.timezone_label,
            max_elevation_deg: self.max_elevation_deg,
            status,
            last_error: self.last_error,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use chrono::Duration;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn insert_assigns_increasing_ids() {
        let store = store();
        let a = store.insert(&notification("a@example.com", now())).unwrap();
        let b = store.insert(&notification("a@example.com", now())).unwrap();
        assert!(b > a);
    }

    #[test]
    fn inserted_record_reads_back_pending() {
        let store = store();
        let n = notification("a@example.com", now());
        let id = store.insert(&n).unwrap();
        let record = store.get(id).unwrap();

        assert_eq!(record.status, NotificationStatus::Pending);
        assert_eq!(record.email, n.email);
        assert_eq!(record.rise_time_utc, n.rise_time_utc);
        assert_eq!(record.notify_at_utc, n.notify_at_utc);
        assert_eq!(record.timezone_label, "UTC-05:00");
        assert_eq!(record.last_error, None);
    }

    #[test]
    fn query_returns_only_due_records_in_status() {
        let store = store();
        let due = store
            .insert(&notification("due@example.com", now() - Duration::minutes(1)))
            .unwrap();
        let exact = store.insert(&notification("exact@example.com", now())).unwrap();
        store
            .insert(&notification("later@example.com", now() + Duration::minutes(1)))
            .unwrap();

        let ids: Vec<i64> = store
            .query(NotificationStatus::Pending, now())
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![due, exact]);
    }

    #[test]
    fn sent_records_leave_pending_query() {
        let store = store();
        let id = store.insert(&notification("a@example.com", now())).unwrap();
        store.update_status(id, NotificationStatus::Sent, None).unwrap();

        assert!(store.query(NotificationStatus::Pending, now()).unwrap().is_empty());
        assert_eq!(store.query(NotificationStatus::Sent, now()).unwrap().len(), 1);
    }

    #[test]
    fn error_status_keeps_message() {
        let store = store();
        let id = store.insert(&notification("a@example.com", now())).unwrap();
        store
            .update_status(id, NotificationStatus::Error, Some("mailbox full"))
            .unwrap();
        let record = store.get(id).unwrap();
        assert_eq!(record.status, NotificationStatus::Error);
        assert_eq!(record.last_error.as_deref(), Some("mailbox full"));
    }

    #[test]
    fn terminal_status_cannot_change() {
        let store = store();
        let id = store.insert(&notification("a@example.com", now())).unwrap();
        store.update_status(id, NotificationStatus::Sent, None).unwrap();

        let err = store
            .update_status(id, NotificationStatus::Error, Some("late"))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidTransition {
                status: NotificationStatus::Sent,
                ..
            }
        ));
        assert_eq!(store.get(id).unwrap().last_error, None);
    }

    #[test]
    fn cannot_move_back_to_pending() {
        let store = store();
        let id = store.insert(&notification("a@example.com", now())).unwrap();
        let err = store
            .update_status(id, NotificationStatus::Pending, None)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let store = store();
        assert!(matches!(store.get(42), Err(StoreError::NotFound(42))));
        assert!(matches!(
            store.update_status(42, NotificationStatus::Sent, None),
            Err(StoreError::NotFound(42))
        ));
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("notifications.db");
        let id = {
            let store = SqliteStore::open(&path).unwrap();
            store.insert(&notification("a@example.com", now())).unwrap()
        };
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get(id).unwrap().email, "a@example.com");
    }

    #[test]
    fn timestamps_are_fixed_width_utc() {
        assert_eq!(format_ts(now()), "2026-03-01T12:00:00.000000000Z");
    }

    #[test]
    fn sub_microsecond_times_read_back_exactly() {
        let store = store();
        let mut n = notification("a@example.com", now());
        n.culmination_time_utc = n.rise_time_utc + Duration::nanoseconds(299_723_845_168);
        let id = store.insert(&n).unwrap();
        assert_eq!(store.get(id).unwrap().culmination_time_utc, n.culmination_time_utc);
    }

    #[test]
    fn unknown_status_in_row_is_corrupt() {
        let store = store();
        let id = store.insert(&notification("a@example.com", now())).unwrap();
        store
            .lock()
            .execute(
                "UPDATE notifications SET status = 'archived' WHERE id = ?1",
                params![id],
            )
            .unwrap();
        assert!(matches!(store.get(id), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn store_keeps_working_after_a_panic_while_locked() {
        let store = std::sync::Arc::new(store());
        let id = store.insert(&notification("a@example.com", now())).unwrap();

        let poisoner = store.clone();
        let result = std::thread::spawn(move || {
            let _guard = poisoner.conn.lock().unwrap();
            panic!("worker died holding the connection");
        })
        .join();
        assert!(result.is_err());
        assert!(store.conn.is_poisoned());

        let due = store.query(NotificationStatus::Pending, now()).unwrap();
        assert_eq!(due.len(), 1);
        store.update_status(id, NotificationStatus::Sent, None).unwrap();
        store.insert(&notification("b@example.com", now())).unwrap();
    }
}
