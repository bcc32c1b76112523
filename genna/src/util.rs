//! Small shared utilities: id generation, timestamps, and the input
//! normalization helpers used by the profile dialogs.

use std::time::{SystemTime, UNIX_EPOCH};

/// Get the current timestamp in Unix milliseconds.
#[must_use]
pub fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Generate a prefixed unique id (e.g. `msg_6f9a...`).
#[must_use]
pub fn generate_id(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
}

/// Generate a unique message id.
#[must_use]
pub fn generate_message_id() -> String {
    generate_id("msg")
}

/// Strip everything but ASCII digits from a phone-style string.
///
/// The profile backend wants bare digits; users type `123-456-7890`.
#[must_use]
pub fn digits_only(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// A postal address tail split out of a `City, State, Zip` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityStateZip {
    /// City name.
    pub city: String,
    /// State name or abbreviation.
    pub state: String,
    /// Postal code.
    pub zip: String,
}

/// Split a comma-separated `City, State, Zip` string into its parts.
///
/// Returns `None` when the input does not contain two commas.
#[must_use]
pub fn split_city_state_zip(input: &str) -> Option<CityStateZip> {
    let mut parts = input.splitn(3, ',');
    let city = parts.next()?.trim();
    let state = parts.next()?.trim();
    let zip = parts.next()?.trim();
    if city.is_empty() || state.is_empty() || zip.is_empty() {
        return None;
    }
    Some(CityStateZip {
        city: city.to_string(),
        state: state.to_string(),
        zip: zip.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only("123-456-7890"), "1234567890");
        assert_eq!(digits_only("(123) 456 7890"), "1234567890");
        assert_eq!(digits_only(""), "");
    }

    #[test]
    fn test_split_city_state_zip() {
        let parsed = split_city_state_zip("Springfield, IL, 62704").unwrap();
        assert_eq!(parsed.city, "Springfield");
        assert_eq!(parsed.state, "IL");
        assert_eq!(parsed.zip, "62704");

        assert!(split_city_state_zip("Springfield").is_none());
        assert!(split_city_state_zip("Springfield, IL").is_none());
    }

    #[test]
    fn test_id_uniqueness() {
        assert_ne!(generate_message_id(), generate_message_id());
        assert!(generate_id("turn").starts_with("turn_"));
    }
}
