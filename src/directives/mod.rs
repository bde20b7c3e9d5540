pub mod builtins;
pub mod fragment;
pub mod registry;

pub use builtins::{builtin_directives, create_default_registry, register_builtins};
pub use fragment::{CodeFragment, CLOSE_TAG, OPEN_TAG};
pub use registry::{Directive, DirectiveRegistry, DirectiveSpec, FnDirective};
