//! Document mappings for the coffee tab collections.

pub mod claim;
pub mod global_config;
pub mod log;
pub mod member;

pub use claim::ClaimEntity;
pub use global_config::GlobalConfigEntity;
pub use log::LogEntity;
pub use member::MemberEntity;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serializer;
use serde_json::Value;

use crate::store::StoreError;

/// Decode a raw document into an entity.
pub fn decode<T: DeserializeOwned>(doc: Value) -> Result<T, StoreError> {
    serde_json::from_value(doc).map_err(|e| StoreError::Decode(e.to_string()))
}

/// Timestamps are written with fixed millisecond precision so they sort
/// lexically.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn serialize_timestamp<S: Serializer>(
    ts: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-01T08:30:00.000Z");
    }

    #[test]
    fn test_decode_error() {
        let result: Result<MemberEntity, _> = decode(serde_json::json!("not an object"));
        assert!(matches!(result, Err(StoreError::Decode(_))));
    }
}
