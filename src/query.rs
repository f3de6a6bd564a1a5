use crate::error::{Result, SearchError};
use crate::options::SearchOptions;
use serde_json::Value;
use url::form_urlencoded::Serializer;

pub const SEARCH_URL: &str = "https://api-adresse.data.gouv.fr/search/";

/// Encodes a term and its options into a request URL.
///
/// Parameters are always written in the same order (`q`, then `autocomplete`, `longitude`,
/// `latitude`, `type`, `postcode`, `citycode`, `limit`) so identical inputs give identical
/// URLs. Nothing is validated here; absent options are simply left out.
pub fn search_url(term: &str, options: Option<&SearchOptions>) -> String {
    let mut query = Serializer::new(String::new());
    query.append_pair("q", term);

    if let Some(options) = options {
        if let Some(autocomplete) = options.autocomplete {
            query.append_pair("autocomplete", &autocomplete.to_string());
        }
        if let Some(longitude) = options.longitude {
            query.append_pair("longitude", &coordinate(longitude));
        }
        if let Some(latitude) = options.latitude {
            query.append_pair("latitude", &coordinate(latitude));
        }
        if let Some(search_type) = options.search_type {
            query.append_pair("type", &search_type.to_string());
        }
        if let Some(postcode) = &options.postcode {
            query.append_pair("postcode", postcode);
        }
        if let Some(citycode) = &options.citycode {
            query.append_pair("citycode", citycode);
        }
        if let Some(limit) = options.limit {
            query.append_pair("limit", &limit.to_string());
        }
    }

    format!("{SEARCH_URL}?{}", query.finish())
}

// Display writes -0.0 as "-0".
fn coordinate(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

/// A search term together with validated options.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchQuery {
    pub term: String,
    pub options: SearchOptions,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>, options: SearchOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            term: term.into(),
            options,
        })
    }

    /// Builds a query from untyped arguments, e.g. values decoded from user supplied JSON.
    /// A missing term is rejected; missing options mean no options.
    pub fn from_values(term: Option<&Value>, options: Option<&Value>) -> Result<Self> {
        let Some(Value::String(term)) = term else {
            return Err(SearchError::ArgumentType {
                position: 1,
                expected: "a string",
            });
        };
        let options = match options {
            Some(value) => SearchOptions::from_value(value)?,
            None => SearchOptions::default(),
        };
        Ok(Self {
            term: term.clone(),
            options,
        })
    }

    pub fn url(&self) -> String {
        search_url(&self.term, Some(&self.options))
    }
}
