#[cfg(feature = "components")]
pub mod components;
pub mod dumper;
pub mod escape;

#[cfg(feature = "components")]
pub use components::inject_slots;
pub use dumper::{HtmlDumper, DUMP_STYLES};
pub use escape::escape_html;
