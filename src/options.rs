use crate::error::{Result, SearchError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};

/// Option keys accepted by the search endpoint, in the order they are checked.
pub const ALLOWED_KEYS: &[&str] = &[
    "limit",
    "autocomplete",
    "longitude",
    "latitude",
    "type",
    "postcode",
    "citycode",
];

const NUMBER: &str = "a Number";
const WHOLE_NUMBER: &str = "a whole Number";
const BOOLEAN: &str = "a Boolean";
const STRING: &str = "a String";

/// The kind of place a search is restricted to.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    EnumString,
    EnumIter,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    clap::ValueEnum,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Street,
    House,
    Locality,
    City,
    Region,
    Country,
}

/// Constraints applied to a search. Absent fields are left out of the request so the
/// service's own defaults apply.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchOptions {
    /// Maximum number of results returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Enables completion of partial terms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autocomplete: Option<bool>,
    /// Favours results close to this longitude.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Favours results close to this latitude.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub search_type: Option<SearchType>,
    #[serde(
        default,
        deserialize_with = "code_from_text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub postcode: Option<String>,
    /// INSEE code of the city results are restricted to.
    #[serde(
        default,
        deserialize_with = "code_from_text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub citycode: Option<String>,
}

/// YAML and environment values such as `44380` arrive as integers. Codes are five
/// characters, so numbers are zero padded to keep `01000` intact.
fn code_from_text_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Code>::deserialize(deserializer)?.map(|code| match code {
        Code::Text(text) => text,
        Code::Number(number) => format!("{number:05}"),
    }))
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn autocomplete(mut self, autocomplete: bool) -> Self {
        self.autocomplete = Some(autocomplete);
        self
    }

    pub fn longitude(mut self, longitude: f64) -> Self {
        self.longitude = Some(longitude);
        self
    }

    pub fn latitude(mut self, latitude: f64) -> Self {
        self.latitude = Some(latitude);
        self
    }

    pub fn search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = Some(search_type);
        self
    }

    pub fn postcode(mut self, postcode: impl Into<String>) -> Self {
        self.postcode = Some(postcode.into());
        self
    }

    pub fn citycode(mut self, citycode: impl Into<String>) -> Self {
        self.citycode = Some(citycode.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Checks the numeric bounds. Types are already guaranteed by the struct, so this is
    /// the part of validation that remains for options built in code.
    pub fn validate(&self) -> Result<()> {
        if let Some(limit) = self.limit {
            check_limit(f64::from(limit))?;
        }
        if let Some(longitude) = self.longitude {
            check_longitude(longitude)?;
        }
        if let Some(latitude) = self.latitude {
            check_latitude(latitude)?;
        }
        Ok(())
    }

    /// Builds options from an untyped record, checking key names, value types and bounds.
    /// Keys are checked in [`ALLOWED_KEYS`] order and the first failure is returned.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(SearchError::ArgumentType {
                position: 2,
                expected: "an Object",
            });
        };

        let unknown: Vec<String> = map
            .keys()
            .filter(|key| !ALLOWED_KEYS.contains(&key.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(SearchError::UnknownOption { keys: unknown });
        }

        let mut options = Self::default();

        if let Some(value) = map.get("limit") {
            let limit = value.as_f64().ok_or(type_error("limit", NUMBER))?;
            check_limit(limit)?;
            if limit.fract() != 0.0 || limit > f64::from(u32::MAX) {
                return Err(type_error("limit", WHOLE_NUMBER));
            }
            options.limit = Some(limit as u32);
        }

        if let Some(value) = map.get("autocomplete") {
            options.autocomplete = Some(value.as_bool().ok_or(type_error("autocomplete", BOOLEAN))?);
        }

        if let Some(value) = map.get("longitude") {
            let longitude = value.as_f64().ok_or(type_error("longitude", NUMBER))?;
            check_longitude(longitude)?;
            options.longitude = Some(longitude);
        }

        if let Some(value) = map.get("latitude") {
            let latitude = value.as_f64().ok_or(type_error("latitude", NUMBER))?;
            check_latitude(latitude)?;
            options.latitude = Some(latitude);
        }

        if let Some(value) = map.get("type") {
            let name = value.as_str().ok_or(type_error("type", STRING))?;
            let search_type =
                SearchType::from_str(name).map_err(|_| SearchError::OptionValue {
                    key: "type",
                    value: name.to_owned(),
                })?;
            options.search_type = Some(search_type);
        }

        if let Some(value) = map.get("postcode") {
            let postcode = value.as_str().ok_or(type_error("postcode", STRING))?;
            options.postcode = Some(postcode.to_owned());
        }

        if let Some(value) = map.get("citycode") {
            let citycode = value.as_str().ok_or(type_error("citycode", STRING))?;
            options.citycode = Some(citycode.to_owned());
        }

        Ok(options)
    }

    /// Layers `overrides` on top of `self`: every field set in `overrides` wins.
    pub fn merge(&self, overrides: &SearchOptions) -> SearchOptions {
        SearchOptions {
            limit: overrides.limit.or(self.limit),
            autocomplete: overrides.autocomplete.or(self.autocomplete),
            longitude: overrides.longitude.or(self.longitude),
            latitude: overrides.latitude.or(self.latitude),
            search_type: overrides.search_type.or(self.search_type),
            postcode: overrides.postcode.clone().or_else(|| self.postcode.clone()),
            citycode: overrides.citycode.clone().or_else(|| self.citycode.clone()),
        }
    }
}

fn type_error(key: &'static str, expected: &'static str) -> SearchError {
    SearchError::OptionType { key, expected }
}

fn check_limit(limit: f64) -> Result<()> {
    if limit < 1.0 {
        return Err(SearchError::OptionRange {
            key: "limit",
            bounds: "greater or equal to 1",
        });
    }
    Ok(())
}

// NaN fails both range checks.
fn check_longitude(longitude: f64) -> Result<()> {
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(SearchError::OptionRange {
            key: "longitude",
            bounds: "between -180 and 180",
        });
    }
    Ok(())
}

fn check_latitude(latitude: f64) -> Result<()> {
    if !(0.0..=90.0).contains(&latitude) {
        return Err(SearchError::OptionRange {
            key: "latitude",
            bounds: "between 0 and 90",
        });
    }
    Ok(())
}
