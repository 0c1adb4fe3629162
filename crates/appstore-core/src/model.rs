//! Catalog records as served by the store backend.
//!
//! These types are shared by every front end and carry no UI concerns. The
//! backend is loose about a few field types (ids and download counts show up
//! both as strings and as numbers), so deserialization accepts either.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One app in the store catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    #[serde(default, deserialize_with = "rating_or_null")]
    pub rating: f32,
    #[serde(default)]
    pub downloads: Downloads,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshots: Option<Vec<String>>,
    #[serde(default)]
    pub developer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apk_filename: Option<String>,
}

impl AppRecord {
    pub fn is_free(&self) -> bool {
        self.price == Price::Free
    }

    pub fn has_apk(&self) -> bool {
        self.apk_filename.as_deref().is_some_and(|f| !f.is_empty())
    }

    pub fn screenshots(&self) -> &[String] {
        self.screenshots.as_deref().unwrap_or_default()
    }
}

/// Price label: the literal "Free" or whatever priced label the developer set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Price {
    #[default]
    Free,
    Paid(String),
}

impl From<String> for Price {
    fn from(label: String) -> Self {
        let trimmed = label.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("free") {
            Price::Free
        } else {
            Price::Paid(label)
        }
    }
}

impl From<Price> for String {
    fn from(price: Price) -> Self {
        match price {
            Price::Free => "Free".to_string(),
            Price::Paid(label) => label,
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Free => f.write_str("Free"),
            Price::Paid(label) => f.write_str(label),
        }
    }
}

/// Download count, either numeric or a display string like "1M+"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Downloads {
    Count(u64),
    Label(String),
}

impl Default for Downloads {
    fn default() -> Self {
        Downloads::Count(0)
    }
}

impl fmt::Display for Downloads {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Downloads::Count(n) => write!(f, "{}", n),
            Downloads::Label(label) => f.write_str(label),
        }
    }
}

/// A browsable catalog category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// Unrated apps come through as `null`
fn rating_or_null<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f32>::deserialize(deserializer)?.unwrap_or_default())
}
