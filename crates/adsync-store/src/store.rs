//! The storage contract shared by every backend.

use adsync_shared::payload::ContentPatch;
use adsync_shared::{ActionState, AdAction, AdContent, AdRecord};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;

/// Message stored when an action fails without a usable description.
const UNKNOWN_ERROR: &str = "unknown error";

/// Keyed store of local ad records.
///
/// Implementations synchronize internally so a single instance can be shared
/// across concurrent requests. Concurrent updates to the same record are
/// last-write-wins.
pub trait AdRecordStore: Send + Sync {
    /// Insert a new record. Fails with `DuplicateSourceId` and leaves the store
    /// untouched if the source id was ever used before.
    fn create(&self, new: NewAdRecord) -> Result<AdRecord>;

    fn get_by_id(&self, id: Uuid) -> Result<Option<AdRecord>>;

    fn get_by_source_id(&self, source_id: &str) -> Result<Option<AdRecord>>;

    /// All records owned by `owner_id`, newest first.
    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<AdRecord>>;

    /// Merge `patch` into the record and refresh `updated_at`.
    /// Fails with `NotFound` if the id does not exist.
    fn update(&self, id: Uuid, patch: AdRecordPatch) -> Result<AdRecord>;

    /// Remove the record. Returns `true` if a record was actually removed.
    fn delete(&self, id: Uuid) -> Result<bool>;
}

// ---------------------------------------------------------------------------
// Insert payload
// ---------------------------------------------------------------------------

/// Everything needed to insert a record; ids and timestamps are generated.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAdRecord {
    pub source_id: String,
    pub vehicle_id: Option<String>,
    pub owner_id: String,
    pub content: AdContent,
    pub last_action: Option<AdAction>,
    pub action_state: Option<ActionState>,
}

impl NewAdRecord {
    pub fn into_record(self, now: DateTime<Utc>) -> AdRecord {
        AdRecord {
            id: Uuid::new_v4(),
            source_id: self.source_id,
            vehicle_id: self.vehicle_id,
            owner_id: self.owner_id,
            category_id: self.content.category_id,
            title: self.content.title,
            body: self.content.body,
            price: self.content.price,
            remote_ad_id: None,
            secondary_remote_ad_id: None,
            remote_state: None,
            last_action: self.last_action,
            action_state: self.action_state,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// Partial update
// ---------------------------------------------------------------------------

/// Fields to merge into an existing record. `None` leaves a field unchanged.
///
/// Remote ids can be set but never cleared. The error message follows the
/// action state: moving to a non-error state clears it, moving to `Error`
/// always leaves a non-empty message behind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdRecordPatch {
    pub category_id: Option<u32>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub price: Option<f64>,
    pub remote_ad_id: Option<String>,
    pub secondary_remote_ad_id: Option<String>,
    pub remote_state: Option<String>,
    pub last_action: Option<AdAction>,
    pub action_state: Option<ActionState>,
    pub error_message: Option<String>,
}

impl AdRecordPatch {
    /// Stamp `action` with `state`.
    pub fn status(action: AdAction, state: ActionState) -> Self {
        Self {
            last_action: Some(action),
            action_state: Some(state),
            ..Default::default()
        }
    }

    /// Record a failed `action`.
    pub fn failed(action: AdAction, message: impl Into<String>) -> Self {
        Self {
            last_action: Some(action),
            action_state: Some(ActionState::Error),
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn from_content(patch: ContentPatch) -> Self {
        Self {
            category_id: patch.category_id,
            title: patch.title,
            body: patch.body,
            price: patch.price,
            ..Default::default()
        }
    }

    /// Apply the patch in place and stamp `updated_at`.
    pub fn apply(self, record: &mut AdRecord, now: DateTime<Utc>) {
        if let Some(v) = self.category_id {
            record.category_id = v;
        }
        if let Some(v) = self.title {
            record.title = v;
        }
        if let Some(v) = self.body {
            record.body = v;
        }
        if let Some(v) = self.price {
            record.price = v;
        }
        if let Some(v) = self.remote_ad_id {
            record.remote_ad_id = Some(v);
        }
        if let Some(v) = self.secondary_remote_ad_id {
            record.secondary_remote_ad_id = Some(v);
        }
        if let Some(v) = self.remote_state {
            record.remote_state = Some(v);
        }
        if let Some(v) = self.last_action {
            record.last_action = Some(v);
        }

        match self.action_state {
            Some(ActionState::Error) => {
                record.action_state = Some(ActionState::Error);
                let message = self
                    .error_message
                    .filter(|m| !m.trim().is_empty())
                    .or_else(|| record.error_message.take())
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
                record.error_message = Some(message);
            }
            Some(state) => {
                record.action_state = Some(state);
                record.error_message = None;
            }
            None => {
                if record.action_state == Some(ActionState::Error) {
                    if let Some(m) = self.error_message.filter(|m| !m.trim().is_empty()) {
                        record.error_message = Some(m);
                    }
                }
            }
        }

        record.updated_at = now;
    }
}
