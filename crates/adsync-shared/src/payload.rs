//! Inbound create/update payloads and their validation.
//!
//! Every field is optional at the serde level so a missing field surfaces as a
//! [`ValidationError`] instead of a generic JSON rejection. Prices are
//! accepted either as numbers or as decimal strings, which is how the
//! dashboard's forms submit them.

use serde::{Deserialize, Deserializer};

use crate::constants::{is_known_category, MAX_PRICE};
use crate::error::ValidationError;
use crate::types::AdContent;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdPayload {
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub category_id: Option<u32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price: Option<PriceInput>,
}

/// A create payload that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCreate {
    pub source_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub content: AdContent,
}

impl CreateAdPayload {
    pub fn validate(self) -> Result<ValidatedCreate, ValidationError> {
        let source_id = non_blank(self.source_id);
        let vehicle_id = non_blank(self.vehicle_id);
        if source_id.is_none() && vehicle_id.is_none() {
            return Err(ValidationError::NoSourceId);
        }

        let category_id = self
            .category_id
            .ok_or(ValidationError::MissingField("categoryId"))?;
        check_category(category_id)?;

        let title = required_text(self.title, "title")?;
        let body = required_text(self.body, "body")?;
        let price = self
            .price
            .ok_or(ValidationError::MissingField("price"))?
            .amount()?;

        Ok(ValidatedCreate {
            source_id,
            vehicle_id,
            content: AdContent {
                category_id,
                title,
                body,
                price,
            },
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdPayload {
    #[serde(default)]
    pub category_id: Option<u32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price: Option<PriceInput>,
}

/// The content fields an update is allowed to change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentPatch {
    pub category_id: Option<u32>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub price: Option<f64>,
}

impl ContentPatch {
    pub fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.title.is_none()
            && self.body.is_none()
            && self.price.is_none()
    }
}

impl UpdateAdPayload {
    pub fn validate(self) -> Result<ContentPatch, ValidationError> {
        let category_id = self.category_id.map(check_category).transpose()?;
        let title = self.title.map(|t| required_text(Some(t), "title")).transpose()?;
        let body = self.body.map(|b| required_text(Some(b), "body")).transpose()?;
        let price = self.price.map(|p| p.amount()).transpose()?;

        let patch = ContentPatch {
            category_id,
            title,
            body,
            price,
        };
        if patch.is_empty() {
            return Err(ValidationError::EmptyUpdate);
        }
        Ok(patch)
    }
}

// ---------------------------------------------------------------------------
// Price
// ---------------------------------------------------------------------------

/// Raw price as submitted: `459000`, `459000.5` or `"459000"`.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

impl PriceInput {
    pub fn amount(&self) -> Result<f64, ValidationError> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| ValidationError::InvalidPrice(s.clone()))?,
        };
        if !value.is_finite() {
            return Err(ValidationError::InvalidPrice(value.to_string()));
        }
        if value <= 0.0 {
            return Err(ValidationError::NonPositivePrice(value));
        }
        // The marketplace takes whole units; anything that would round to 0
        // or overflow the wire amount is rejected here.
        if value.round() < 1.0 || value > MAX_PRICE {
            return Err(ValidationError::InvalidPrice(value.to_string()));
        }
        Ok(value)
    }
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<PriceInput>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Number(n) => PriceInput::Number(n),
        Raw::Text(s) => PriceInput::Text(s),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    let value = value.ok_or(ValidationError::MissingField(field))?;
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(value)
}

fn check_category(id: u32) -> Result<u32, ValidationError> {
    if is_known_category(id) {
        Ok(id)
    } else {
        Err(ValidationError::UnknownCategory(id))
    }
}
