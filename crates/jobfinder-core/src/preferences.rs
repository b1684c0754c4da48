//! User preferences. Every key is optional and an absent, empty or malformed value
//! disables the corresponding filter stage instead of failing the load.

use std::path::Path;

use anyhow::Context;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::LocationType;

pub const DEFAULT_PREFERRED_DAYS_OLD: i64 = 7;
pub const DEFAULT_MAX_DAYS_OLD: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    #[serde(deserialize_with = "lenient_list")]
    pub role_levels: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub exclude_roles: Vec<String>,
    #[serde(deserialize_with = "lenient_section")]
    pub location: LocationPreferences,
    #[serde(deserialize_with = "lenient_section")]
    pub keywords: KeywordPreferences,
    #[serde(deserialize_with = "lenient_section")]
    pub freshness: FreshnessPreferences,
    #[serde(deserialize_with = "lenient_section")]
    pub search: SearchPreferences,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationPreferences {
    /// City names matched locally against the job's location text.
    #[serde(deserialize_with = "lenient_list")]
    pub preferred: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub location_types: Vec<String>,
    /// Raw location query handed to adapters whose upstream search constrains location.
    #[serde(rename = "where", deserialize_with = "lenient_string")]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordPreferences {
    #[serde(deserialize_with = "lenient_list")]
    pub include: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FreshnessPreferences {
    #[serde(deserialize_with = "lenient_days")]
    pub preferred_days_old: Option<i64>,
    #[serde(deserialize_with = "lenient_days")]
    pub max_days_old: Option<i64>,
}

/// Upstream search hints for adapters that accept a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchPreferences {
    #[serde(deserialize_with = "lenient_string")]
    pub what: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub what_exclude: Option<String>,
}

impl Preferences {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading preferences {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing preferences {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}

impl LocationPreferences {
    /// Parsed allow-list; unrecognised entries are skipped.
    pub fn allowed_types(&self) -> Vec<LocationType> {
        let mut out = Vec::new();
        for raw in &self.location_types {
            match raw.parse::<LocationType>() {
                Ok(kind) if !out.contains(&kind) => out.push(kind),
                Ok(_) => {}
                Err(err) => tracing::warn!(%err, "ignoring location type preference"),
            }
        }
        out
    }
}

impl FreshnessPreferences {
    pub fn preferred_days_old(&self) -> i64 {
        self.preferred_days_old.filter(|days| *days > 0).unwrap_or(DEFAULT_PREFERRED_DAYS_OLD)
    }

    pub fn max_days_old(&self) -> i64 {
        self.max_days_old.filter(|days| *days > 0).unwrap_or(DEFAULT_MAX_DAYS_OLD)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListShape {
    Many(Vec<String>),
    One(String),
    Other(IgnoredAny),
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match ListShape::deserialize(deserializer)? {
        ListShape::Many(items) => items,
        ListShape::One(item) => vec![item],
        ListShape::Other(_) => Vec::new(),
    };
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringShape {
    Text(String),
    Other(IgnoredAny),
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringShape::deserialize(deserializer)? {
        StringShape::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DaysShape {
    Days(i64),
    Other(IgnoredAny),
}

fn lenient_days<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    // Zero reads as unset, the same as an absent key.
    Ok(match DaysShape::deserialize(deserializer)? {
        DaysShape::Days(days) if days > 0 => Some(days),
        _ => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SectionShape<T> {
    Section(T),
    Other(IgnoredAny),
}

fn lenient_section<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(match SectionShape::<T>::deserialize(deserializer)? {
        SectionShape::Section(section) => section,
        SectionShape::Other(_) => T::default(),
    })
}
