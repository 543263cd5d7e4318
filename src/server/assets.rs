//! Static asset constants (CSS and JavaScript).

/// Stylesheet for the control page.
pub const CSS: &str = include_str!("styles.css");

/// Client-side validation, batch start and status polling.
pub const JS: &str = include_str!("scripts.js");
