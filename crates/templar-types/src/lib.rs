pub mod extension;
pub mod value;

pub use extension::{TemplateFunction, ValueDumper};
pub use value::{Map, Record, Value};
