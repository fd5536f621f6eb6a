//! Checks which relate to Liquid objects, variables and templates.

use crate::group;

group! {
    /// Checks which relate to Liquid objects, variables and templates.
    liquid,
    undefined_object::UndefinedObject,
    unused_assign::UnusedAssign,
    missing_template::MissingTemplate,
}
