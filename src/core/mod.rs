pub mod config;
pub mod context;
pub mod variable_path;

pub use config::TemplarConfig;
pub use context::DataContext;
pub use variable_path::{resolve_segment, PathSegment, VariableLookup, VariablePath};
