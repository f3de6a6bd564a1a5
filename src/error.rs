use crate::options::{SearchType, ALLOWED_KEYS};
use strum::IntoEnumIterator;
use thiserror::Error;

/// Broad category of a [`SearchError`], for callers that branch on the failure rather than
/// match every variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// An argument or option had the wrong type.
    Type,
    /// A numeric option was outside its closed interval.
    Range,
    /// A string option was not one of its allowed values.
    Value,
    /// An option key is not part of the allow-list.
    UnknownKey,
    /// The service answered with something other than 200.
    RemoteFailure,
    /// No response was received at all.
    Transport,
    /// A 200 response whose body is not a feature collection.
    Decode,
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("expected argument {position} to be {expected}")]
    ArgumentType {
        position: u8,
        expected: &'static str,
    },
    #[error("unknown option {} (allowed: {})", .keys.join(", "), ALLOWED_KEYS.join(", "))]
    UnknownOption { keys: Vec<String> },
    #[error("expected key options.{key} to be {expected}")]
    OptionType {
        key: &'static str,
        expected: &'static str,
    },
    #[error("expected key options.{key} to be {bounds}")]
    OptionRange {
        key: &'static str,
        bounds: &'static str,
    },
    #[error("unknown value {value} for key options.{key} (allowed: {})", allowed_types())]
    OptionValue { key: &'static str, value: String },
    #[error("failed to get the results with message {status_text} (code: {status})")]
    Remote { status: u16, status_text: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("failed to decode the results: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ArgumentType { .. } | Self::OptionType { .. } => ErrorKind::Type,
            Self::UnknownOption { .. } => ErrorKind::UnknownKey,
            Self::OptionRange { .. } => ErrorKind::Range,
            Self::OptionValue { .. } => ErrorKind::Value,
            Self::Remote { .. } => ErrorKind::RemoteFailure,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Decode(_) => ErrorKind::Decode,
        }
    }

    /// True for every failure raised before a request is sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Type | ErrorKind::Range | ErrorKind::Value | ErrorKind::UnknownKey
        )
    }
}

fn allowed_types() -> String {
    SearchType::iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_option_lists_keys_and_allow_list() {
        let err = SearchError::UnknownOption {
            keys: vec!["some".into(), "other".into()],
        };
        assert_eq!(
            err.to_string(),
            "unknown option some, other (allowed: limit, autocomplete, longitude, latitude, type, postcode, citycode)"
        );
        assert_eq!(err.kind(), ErrorKind::UnknownKey);
    }

    #[test]
    fn option_value_lists_search_types() {
        let err = SearchError::OptionValue {
            key: "type",
            value: "foo".into(),
        };
        assert_eq!(
            err.to_string(),
            "unknown value foo for key options.type (allowed: street, house, locality, city, region, country)"
        );
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn remote_failure_embeds_status() {
        let err = SearchError::Remote {
            status: 503,
            status_text: "Service Unavailable".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to get the results with message Service Unavailable (code: 503)"
        );
        assert!(!err.is_validation());
    }
}
