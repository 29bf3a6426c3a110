//! Domain types shared by the store, the marketplace client and the server.
//!
//! Everything here derives `Serialize` and `Deserialize` with camelCase field
//! names so records can be handed straight to the dashboard as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Sync bookkeeping
// ---------------------------------------------------------------------------

/// The most recent operation attempted on an ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdAction {
    Create,
    Update,
    Bump,
    Delete,
}

impl AdAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Bump => "bump",
            Self::Delete => "delete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "bump" => Some(Self::Bump),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for AdAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the last action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionState {
    Processing,
    Done,
    Error,
}

impl ActionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(Self::Processing),
            "done" => Some(Self::Done),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Ad record
// ---------------------------------------------------------------------------

/// Editable ad content. Validated before it is ever stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdContent {
    pub category_id: u32,
    pub title: String,
    pub body: String,
    pub price: f64,
}

/// One advertisement as known locally, whether or not it ever reached the
/// marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdRecord {
    /// Generated at creation, immutable.
    pub id: Uuid,
    /// Correlation key shared with the marketplace. Unique, immutable.
    pub source_id: String,
    /// Weak reference to an externally owned vehicle.
    pub vehicle_id: Option<String>,
    /// User that created the ad.
    pub owner_id: String,

    pub category_id: u32,
    pub title: String,
    pub body: String,
    pub price: f64,

    /// Set once the marketplace confirms creation, never cleared afterwards.
    pub remote_ad_id: Option<String>,
    /// Id on the mirror marketplace (Bytbil).
    pub secondary_remote_ad_id: Option<String>,
    /// The marketplace's own lifecycle tag, e.g. `created` or `deleted`.
    pub remote_state: Option<String>,

    pub last_action: Option<AdAction>,
    pub action_state: Option<ActionState>,
    /// Non-empty whenever `action_state` is `Error`.
    pub error_message: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdRecord {
    pub fn content(&self) -> AdContent {
        AdContent {
            category_id: self.category_id,
            title: self.title.clone(),
            body: self.body.clone(),
            price: self.price,
        }
    }

    /// Whether a create has ever been confirmed by the marketplace.
    pub fn is_published(&self) -> bool {
        self.remote_ad_id.is_some()
    }
}

/// Default marketplace correlation key for a vehicle ad.
pub fn vehicle_source_id(vehicle_id: &str, at: DateTime<Utc>) -> String {
    format!("vehicle-{}-{}", vehicle_id, at.timestamp_millis())
}

// ---------------------------------------------------------------------------
// Externally owned entities
// ---------------------------------------------------------------------------

/// A vehicle from the dealership inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    pub vin: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(default)]
    pub trim: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    /// Odometer reading in km.
    #[serde(default)]
    pub mileage: Option<u32>,
    #[serde(default)]
    pub price: Option<f64>,
}

/// A dashboard user. Only the fields needed for ad contact info are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub dealership: Option<String>,
}

impl UserProfile {
    pub fn contact_info(&self) -> ContactInfo {
        ContactInfo {
            name: self.name.clone(),
            phone: self.phone.clone(),
            email: Some(self.email.clone()),
            company: self.dealership.clone(),
        }
    }
}

/// Contact details printed on a marketplace ad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}
