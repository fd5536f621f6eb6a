//! Deserialization of check entries.

use serde::de::{Error, Unexpected, Visitor};
use serde::Deserializer;
use std::fmt;
use themecheck_core::Severity;

/// A severity written as a name (`"warning"`) or as a level (`1`).
pub(crate) fn severity<'de, D>(deserializer: D) -> Result<Option<Severity>, D::Error>
where
    D: Deserializer<'de>,
{
    struct SeverityVisitor;

    impl<'de> Visitor<'de> for SeverityVisitor {
        type Value = Option<Severity>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("one of \"error\", \"warning\", \"info\" or a level from 0 to 2")
        }

        fn visit_str<E: Error>(self, value: &str) -> Result<Self::Value, E> {
            value
                .parse()
                .map(Some)
                .map_err(|_| E::invalid_value(Unexpected::Str(value), &self))
        }

        fn visit_i64<E: Error>(self, value: i64) -> Result<Self::Value, E> {
            u8::try_from(value)
                .ok()
                .and_then(Severity::from_level)
                .map(Some)
                .ok_or_else(|| E::invalid_value(Unexpected::Signed(value), &self))
        }

        fn visit_u64<E: Error>(self, value: u64) -> Result<Self::Value, E> {
            u8::try_from(value)
                .ok()
                .and_then(Severity::from_level)
                .map(Some)
                .ok_or_else(|| E::invalid_value(Unexpected::Unsigned(value), &self))
        }
    }

    deserializer.deserialize_any(SeverityVisitor)
}
