//! Small shared helpers.

mod html;
mod js;

pub use html::html_escape;
pub use js::js_string;
