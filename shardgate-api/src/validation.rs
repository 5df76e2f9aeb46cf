//! Inbound object ID validation.
//!
//! IDs are 1 to 32 ASCII letters or digits. Anything else is rejected before
//! it reaches the gateway.

use once_cell::sync::Lazy;
use regex::Regex;
use shardgate_core::ObjectId;

use crate::error::{ApiError, ApiResult};

static OBJECT_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-zA-Z0-9]{1,32}$").expect("object ID pattern compiles"));

/// Validate a raw path segment and turn it into an [`ObjectId`].
pub fn validate_object_id(raw: &str) -> ApiResult<ObjectId> {
    if !OBJECT_ID_PATTERN.is_match(raw) {
        return Err(ApiError::invalid_object_id());
    }
    ObjectId::new(raw).map_err(|_| ApiError::invalid_object_id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_ids() {
        for id in ["1", "foo", "FOo0", "abcdefghijklmnopqrstuvwxyz012345"] {
            assert!(validate_object_id(id).is_ok(), "{} should be valid", id);
        }
    }

    #[test]
    fn test_invalid_ids() {
        for id in [
            "",
            "foo-bar",
            "foo_bar",
            "foo/bar",
            "ünïcode",
            "abcdefghijklmnopqrstuvwxyz0123456",
        ] {
            assert!(validate_object_id(id).is_err(), "{} should be invalid", id);
        }
    }

    proptest! {
        #[test]
        fn prop_alphanumeric_ids_up_to_32_accepted(id in "[a-zA-Z0-9]{1,32}") {
            let object_id = validate_object_id(&id).unwrap();
            prop_assert_eq!(object_id.as_str(), id.as_str());
        }

        #[test]
        fn prop_long_ids_rejected(id in "[a-zA-Z0-9]{33,64}") {
            prop_assert!(validate_object_id(&id).is_err());
        }
    }
}
