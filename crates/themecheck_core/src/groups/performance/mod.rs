//! Checks which relate to the loading performance of a theme.

use crate::group;

group! {
    /// Checks which relate to the loading performance of a theme.
    performance,
    asset_size_css::AssetSizeCss,
}
