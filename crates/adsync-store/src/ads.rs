//! SQLite-backed [`AdRecordStore`].

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use adsync_shared::{ActionState, AdAction, AdRecord};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::store::{AdRecordPatch, AdRecordStore, NewAdRecord};

const SELECT_COLUMNS: &str = "SELECT id, source_id, vehicle_id, owner_id, category_id, title, body, price,
        remote_ad_id, secondary_remote_ad_id, remote_state,
        last_action, action_state, error_message, created_at, updated_at
 FROM ad_records";

/// Ad records persisted in a SQLite file.
///
/// `rusqlite::Connection` is not `Sync`, so the database sits behind a mutex
/// and every call runs to completion while holding it.
pub struct SqliteAdStore {
    db: Mutex<Database>,
}

impl SqliteAdStore {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open_at(path)?))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Database>> {
        self.db.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl AdRecordStore for SqliteAdStore {
    fn create(&self, new: NewAdRecord) -> Result<AdRecord> {
        let mut db = self.lock()?;
        let tx = db.conn_mut().transaction()?;

        let taken: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM ad_records WHERE source_id = ?1)
                 OR EXISTS(SELECT 1 FROM retired_source_ids WHERE source_id = ?1)",
            params![new.source_id],
            |row| row.get(0),
        )?;
        if taken {
            return Err(StoreError::DuplicateSourceId(new.source_id));
        }

        let record = new.into_record(Utc::now());
        tx.execute(
            "INSERT INTO ad_records (
                id, source_id, vehicle_id, owner_id, category_id, title, body, price,
                remote_ad_id, secondary_remote_ad_id, remote_state,
                last_action, action_state, error_message, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                record.id.to_string(),
                record.source_id,
                record.vehicle_id,
                record.owner_id,
                record.category_id,
                record.title,
                record.body,
                record.price,
                record.remote_ad_id,
                record.secondary_remote_ad_id,
                record.remote_state,
                record.last_action.map(|a| a.as_str()),
                record.action_state.map(|s| s.as_str()),
                record.error_message,
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::DuplicateSourceId(record.source_id.clone())
            }
            other => StoreError::Sqlite(other),
        })?;
        tx.commit()?;

        tracing::debug!(id = %record.id, source_id = %record.source_id, "Stored ad record");
        Ok(record)
    }

    fn get_by_id(&self, id: Uuid) -> Result<Option<AdRecord>> {
        let db = self.lock()?;
        db.conn()
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id.to_string()],
                row_to_record,
            )
            .optional()
            .map_err(StoreError::Sqlite)
    }

    fn get_by_source_id(&self, source_id: &str) -> Result<Option<AdRecord>> {
        let db = self.lock()?;
        db.conn()
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE source_id = ?1"),
                params![source_id],
                row_to_record,
            )
            .optional()
            .map_err(StoreError::Sqlite)
    }

    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<AdRecord>> {
        let db = self.lock()?;
        let mut stmt = db.conn().prepare(&format!(
            "{SELECT_COLUMNS} WHERE owner_id = ?1 ORDER BY created_at DESC"
        ))?;
        let rows = stmt.query_map(params![owner_id], row_to_record)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    fn update(&self, id: Uuid, patch: AdRecordPatch) -> Result<AdRecord> {
        let mut db = self.lock()?;
        let tx = db.conn_mut().transaction()?;

        let mut record = tx
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id.to_string()],
                row_to_record,
            )
            .optional()?
            .ok_or(StoreError::NotFound(id))?;

        patch.apply(&mut record, Utc::now());

        tx.execute(
            "UPDATE ad_records SET
                category_id = ?2, title = ?3, body = ?4, price = ?5,
                remote_ad_id = ?6, secondary_remote_ad_id = ?7, remote_state = ?8,
                last_action = ?9, action_state = ?10, error_message = ?11, updated_at = ?12
             WHERE id = ?1",
            params![
                record.id.to_string(),
                record.category_id,
                record.title,
                record.body,
                record.price,
                record.remote_ad_id,
                record.secondary_remote_ad_id,
                record.remote_state,
                record.last_action.map(|a| a.as_str()),
                record.action_state.map(|s| s.as_str()),
                record.error_message,
                record.updated_at.to_rfc3339(),
            ],
        )?;
        tx.commit()?;

        Ok(record)
    }

    fn delete(&self, id: Uuid) -> Result<bool> {
        let mut db = self.lock()?;
        let tx = db.conn_mut().transaction()?;

        let source_id: Option<String> = tx
            .query_row(
                "SELECT source_id FROM ad_records WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(source_id) = source_id else {
            return Ok(false);
        };

        tx.execute(
            "INSERT OR IGNORE INTO retired_source_ids (source_id, retired_at) VALUES (?1, ?2)",
            params![source_id, Utc::now().to_rfc3339()],
        )?;
        let affected = tx.execute("DELETE FROM ad_records WHERE id = ?1", params![id.to_string()])?;
        tx.commit()?;

        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn conversion_error(
    col: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_timestamp(col: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(col, e))
}

/// Map a `rusqlite::Row` to an [`AdRecord`].
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<AdRecord> {
    let id_str: String = row.get(0)?;
    let last_action: Option<String> = row.get(11)?;
    let action_state: Option<String> = row.get(12)?;
    let created_str: String = row.get(14)?;
    let updated_str: String = row.get(15)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| conversion_error(0, e))?;

    let last_action = last_action
        .map(|s| {
            AdAction::parse(&s).ok_or_else(|| {
                conversion_error(11, StoreError::Corrupt(format!("unknown action '{s}'")))
            })
        })
        .transpose()?;
    let action_state = action_state
        .map(|s| {
            ActionState::parse(&s).ok_or_else(|| {
                conversion_error(12, StoreError::Corrupt(format!("unknown action state '{s}'")))
            })
        })
        .transpose()?;

    Ok(AdRecord {
        id,
        source_id: row.get(1)?,
        vehicle_id: row.get(2)?,
        owner_id: row.get(3)?,
        category_id: row.get(4)?,
        title: row.get(5)?,
        body: row.get(6)?,
        price: row.get(7)?,
        remote_ad_id: row.get(8)?,
        secondary_remote_ad_id: row.get(9)?,
        remote_state: row.get(10)?,
        last_action,
        action_state,
        error_message: row.get(13)?,
        created_at: parse_timestamp(14, &created_str)?,
        updated_at: parse_timestamp(15, &updated_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsync_shared::AdContent;

    fn store() -> SqliteAdStore {
        SqliteAdStore::new(Database::open_in_memory().unwrap())
    }

    fn new_ad(source_id: &str, owner: &str) -> NewAdRecord {
        NewAdRecord {
            source_id: source_id.into(),
            vehicle_id: Some("vehicle-2".into()),
            owner_id: owner.into(),
            content: AdContent {
                category_id: 1020,
                title: "2024 Toyota Camry LE".into(),
                body: "Blue, 100 km".into(),
                price: 27000.0,
            },
            last_action: Some(AdAction::Create),
            action_state: Some(ActionState::Processing),
        }
    }

    #[test]
    fn test_create_and_read_back() {
        let store = store();
        let record = store.create(new_ad("v-2-1000", "user-1")).unwrap();

        let loaded = store.get_by_id(record.id).unwrap().unwrap();
        assert_eq!(loaded.source_id, "v-2-1000");
        assert_eq!(loaded.last_action, Some(AdAction::Create));
        assert_eq!(loaded.action_state, Some(ActionState::Processing));
        assert_eq!(loaded.created_at.timestamp_millis(), record.created_at.timestamp_millis());

        let by_source = store.get_by_source_id("v-2-1000").unwrap().unwrap();
        assert_eq!(by_source.id, record.id);
    }

    #[test]
    fn test_duplicate_source_id() {
        let store = store();
        store.create(new_ad("dup", "user-1")).unwrap();
        let err = store.create(new_ad("dup", "user-1")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateSourceId(_)));
        assert_eq!(store.list_by_owner("user-1").unwrap().len(), 1);
    }

    #[test]
    fn test_update_persists_patch() {
        let store = store();
        let record = store.create(new_ad("v-2-1000", "user-1")).unwrap();

        store
            .update(
                record.id,
                AdRecordPatch {
                    remote_ad_id: Some("R1".into()),
                    remote_state: Some("created".into()),
                    ..AdRecordPatch::status(AdAction::Create, ActionState::Done)
                },
            )
            .unwrap();
        store
            .update(record.id, AdRecordPatch::failed(AdAction::Bump, "Marketplace returned 503"))
            .unwrap();

        let loaded = store.get_by_id(record.id).unwrap().unwrap();
        assert_eq!(loaded.remote_ad_id.as_deref(), Some("R1"));
        assert_eq!(loaded.last_action, Some(AdAction::Bump));
        assert_eq!(loaded.action_state, Some(ActionState::Error));
        assert_eq!(loaded.error_message.as_deref(), Some("Marketplace returned 503"));
    }

    #[test]
    fn test_update_missing() {
        let store = store();
        assert!(matches!(
            store.update(Uuid::new_v4(), AdRecordPatch::default()),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_retires_source_id() {
        let store = store();
        let record = store.create(new_ad("v-2-1000", "user-1")).unwrap();

        assert!(store.delete(record.id).unwrap());
        assert!(!store.delete(record.id).unwrap());
        assert!(store.get_by_id(record.id).unwrap().is_none());
        assert!(matches!(
            store.create(new_ad("v-2-1000", "user-1")),
            Err(StoreError::DuplicateSourceId(_))
        ));
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ads.db");

        let id = {
            let store = SqliteAdStore::open(&path).unwrap();
            store.create(new_ad("persisted", "user-1")).unwrap().id
        };

        let store = SqliteAdStore::open(&path).unwrap();
        assert_eq!(store.get_by_id(id).unwrap().unwrap().source_id, "persisted");
    }
}
