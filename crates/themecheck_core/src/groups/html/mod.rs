//! Checks which relate to the HTML of templates.

use crate::group;

group! {
    /// Checks which relate to the HTML of templates.
    html,
    parser_blocking_script::ParserBlockingScript,
}
