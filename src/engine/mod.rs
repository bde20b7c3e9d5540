pub mod executor;
pub mod program;
pub mod scope;

pub use executor::Executor;
pub use program::{Node, Program};
pub use scope::Scope;
