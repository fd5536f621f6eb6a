//! All of the groups of built in checks in the linter.

pub mod html;
pub mod json;
pub mod liquid;
pub mod performance;

pub use html::html;
pub use json::json;
pub use liquid::liquid;
pub use performance::performance;

/// Macro for easily making a check group.
/// This will call `::new()` on each check.
#[macro_export]
macro_rules! group {
    ($(#[$description:meta])* $groupname:ident, $($path:ident::$check:ident),* $(,)?) => {
        use $crate::Check;
        $(
            mod $path;
            pub use $path::$check;
        )*

        $(#[$description])*
        pub fn $groupname() -> Vec<Box<dyn Check>> {
            vec![$(Box::new($check::new()) as Box<dyn Check>),*]
        }
    };
}
