//! Per-check run settings and the option schema checks declare.

use crate::{Rule, Severity};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// The JSON type an option of a check accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl SchemaType {
    /// Whether a configured JSON value is acceptable for an option of this type.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            SchemaType::String => value.is_string(),
            SchemaType::Number => value.is_number(),
            SchemaType::Integer => value.is_i64() || value.is_u64(),
            SchemaType::Boolean => value.is_boolean(),
            SchemaType::Array => value.is_array(),
            SchemaType::Object => value.is_object(),
        }
    }
}

/// The description of a single option of a check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaProp {
    #[serde(rename = "type")]
    pub kind: SchemaType,
    pub default: Value,
    pub description: &'static str,
}

/// The options a check accepts, keyed by option name.
pub type ConfigSchema = BTreeMap<&'static str, SchemaProp>;

/// Rust types usable as check options.
pub trait OptionType {
    fn schema_type() -> SchemaType;
}

macro_rules! option_types {
    ($kind:ident => $($ty:ty),* $(,)?) => {
        $(
            impl OptionType for $ty {
                fn schema_type() -> SchemaType {
                    SchemaType::$kind
                }
            }
        )*
    };
}

option_types!(String => String);
option_types!(Boolean => bool);
option_types!(Integer => u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);
option_types!(Number => f32, f64);

impl<T> OptionType for Vec<T> {
    fn schema_type() -> SchemaType {
        SchemaType::Array
    }
}

impl<V> OptionType for BTreeMap<String, V> {
    fn schema_type() -> SchemaType {
        SchemaType::Object
    }
}

impl<V> OptionType for HashMap<String, V> {
    fn schema_type() -> SchemaType {
        SchemaType::Object
    }
}

/// The settings of one check for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckSettings {
    /// Whether the check runs, checks not explicitly configured run if they are recommended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Overrides the default severity of the check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    /// Check specific options, deserialized by the check into its option struct.
    #[serde(default, flatten)]
    pub options: Map<String, Value>,
}

/// The configuration the engine runs a file with.
///
/// This is produced by a config resolver (such as the `themecheck_config` crate) and
/// is opaque to checks, which only ever see their own [`CheckSettings`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    #[serde(default)]
    pub checks: BTreeMap<String, CheckSettings>,
}

impl ResolvedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, code: &str) -> &mut CheckSettings {
        self.checks.entry(code.to_string()).or_default()
    }

    pub fn enable(mut self, code: &str) -> Self {
        self.entry(code).enabled = Some(true);
        self
    }

    pub fn disable(mut self, code: &str) -> Self {
        self.entry(code).enabled = Some(false);
        self
    }

    pub fn severity(mut self, code: &str, severity: Severity) -> Self {
        self.entry(code).severity = Some(severity);
        self
    }

    pub fn option(mut self, code: &str, key: &str, value: impl Into<Value>) -> Self {
        self.entry(code).options.insert(key.to_string(), value.into());
        self
    }

    /// The configured settings of a check, or the defaults if it is not configured.
    pub fn settings_for<R: Rule + ?Sized>(&self, rule: &R) -> CheckSettings {
        self.checks.get(rule.code()).cloned().unwrap_or_default()
    }

    pub fn is_enabled<R: Rule + ?Sized>(&self, rule: &R) -> bool {
        self.checks
            .get(rule.code())
            .and_then(|settings| settings.enabled)
            .unwrap_or_else(|| rule.recommended())
    }

    /// The severity offenses of a check are reported with.
    pub fn effective_severity<R: Rule + ?Sized>(&self, rule: &R) -> Severity {
        self.checks
            .get(rule.code())
            .and_then(|settings| settings.severity)
            .unwrap_or_else(|| rule.severity())
    }
}
