//! JSON bodies exchanged with the Pro Import API (v3).

use adsync_shared::constants::DEFAULT_CURRENCY;
use adsync_shared::payload::ContentPatch;
use adsync_shared::{AdContent, ContactInfo};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    Fixed,
    Negotiable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    /// Whole currency units.
    pub amount: i64,
    pub currency: String,
    #[serde(rename = "type")]
    pub kind: PriceType,
}

impl Price {
    /// Rounded to whole units.
    pub fn negotiable(amount: f64) -> Self {
        Self {
            amount: amount.round() as i64,
            currency: DEFAULT_CURRENCY.to_string(),
            kind: PriceType::Negotiable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub region: String,
    pub municipality: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

/// Body of `POST /ad`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdRequest {
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dealer_code: Option<String>,
    pub category_id: u32,
    pub title: String,
    pub body: String,
    pub price: Vec<Price>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub contact: ContactInfo,
}

impl AdRequest {
    /// Replace the vehicle-derived content with the ad's own.
    pub fn with_content(mut self, content: &AdContent) -> Self {
        self.category_id = content.category_id;
        self.title = content.title.clone();
        self.body = content.body.clone();
        self.price = vec![Price::negotiable(content.price)];
        self
    }
}

/// Body of `PUT /ad/{source_id}`. Only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Vec<Price>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactInfo>,
}

impl AdUpdate {
    pub fn from_patch(patch: &ContentPatch) -> Self {
        Self {
            category_id: patch.category_id,
            title: patch.title.clone(),
            body: patch.body.clone(),
            price: patch.price.map(|p| vec![Price::negotiable(p)]),
            contact: None,
        }
    }
}

/// Per-channel exclusions for a bump. Also the body of the bump endpoint
/// exposed to the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BumpOptions {
    #[serde(default)]
    pub exclude_blocket: bool,
    #[serde(default)]
    pub exclude_bytbil: bool,
}

impl BumpOptions {
    /// Query parameters; flags are only sent when set.
    pub fn query_pairs(&self) -> Vec<(&'static str, &'static str)> {
        let mut pairs = Vec::new();
        if self.exclude_blocket {
            pairs.push(("exclude_blocket", "true"));
        }
        if self.exclude_bytbil {
            pairs.push(("exclude_bytbil", "true"));
        }
        pairs
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    Create,
    Update,
    Bump,
    Boost,
    HandleMedia,
    Publish,
    Delete,
    Unpublish,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogState {
    Processing,
    Done,
    Error,
    #[serde(other)]
    Other,
}

/// One processing event the marketplace recorded for an ad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    pub id: String,
    pub action: LogAction,
    pub state: LogState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub created_at: String,
}

/// Ad as the marketplace sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdResponse {
    pub id: String,
    pub source_id: String,
    /// Lifecycle tag: `created` or `deleted`.
    pub state: String,
    #[serde(default)]
    pub blocket_ad_id: Option<String>,
    #[serde(default)]
    pub bytbil_ad_id: Option<String>,
    #[serde(default)]
    pub dealer_code: Option<String>,
    #[serde(default)]
    pub category_id: Option<u32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub price: Vec<Price>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub logs: Vec<LogMessage>,
}

impl AdResponse {
    /// Id of the published ad: the primary channel's id when reported,
    /// otherwise the import API's own id.
    ///
    /// With the fallback, a local record counts as published (and can be
    /// bumped) once the import API has accepted the ad, even if the primary
    /// channel has not confirmed it yet.
    pub fn remote_ad_id(&self) -> String {
        self.blocket_ad_id.clone().unwrap_or_else(|| self.id.clone())
    }

    pub fn secondary_remote_ad_id(&self) -> Option<String> {
        self.bytbil_ad_id.clone()
    }
}
