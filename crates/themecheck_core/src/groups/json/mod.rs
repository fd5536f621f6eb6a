//! Checks which run on JSON templates, settings and locales.

use crate::group;

group! {
    /// Checks which run on JSON templates, settings and locales.
    json,
    json_duplicate_keys::JsonDuplicateKeys,
}
