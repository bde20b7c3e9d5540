pub mod ast;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod operators;
pub mod parser;
pub mod type_coercion;

pub use eval::{evaluate, execute, execute_all, Environment};
pub use functions::FunctionRegistry;
pub use parser::{parse_expression, parse_for_header, parse_foreach_header, parse_statements};
pub use type_coercion::{is_truthy, to_display_string};
