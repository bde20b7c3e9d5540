//! The built-in directive set.
//!
//! Each directive is its own unit struct so embedders can pick individual
//! ones into a custom registry.

use std::sync::Arc;

use super::fragment::CodeFragment;
use super::registry::{Directive, DirectiveRegistry};
use crate::error::TemplateResult;

macro_rules! directive {
    ($(#[$meta:meta])* $ty:ident, $name:literal, args, |$arg:ident| $body:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $ty;

        impl Directive for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn has_arguments(&self) -> bool {
                true
            }

            fn compile(&self, $arg: &str) -> CodeFragment {
                $body
            }
        }
    };
    ($(#[$meta:meta])* $ty:ident, $name:literal, bare) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $ty;

        impl Directive for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn has_arguments(&self) -> bool {
                false
            }

            fn compile(&self, _argument: &str) -> CodeFragment {
                CodeFragment::keyword($name)
            }
        }
    };
}

directive!(
    /// `@php(statements)` runs assignments and expression statements.
    PhpDirective, "php", args, |arg| CodeFragment::exec(arg)
);
directive!(IfDirective, "if", args, |arg| CodeFragment::open("if", arg));
directive!(ElseIfDirective, "elseif", args, |arg| CodeFragment::open("elseif", arg));
directive!(ElseDirective, "else", bare);
directive!(EndIfDirective, "endif", bare);
directive!(
    /// `@foreach($items as $item)` or `@foreach($map as $key => $value)`.
    ForeachDirective, "foreach", args, |arg| CodeFragment::open("foreach", arg)
);
directive!(EndForeachDirective, "endforeach", bare);
directive!(
    /// `@for(init; condition; step)`.
    ForDirective, "for", args, |arg| CodeFragment::open("for", arg)
);
directive!(EndForDirective, "endfor", bare);
directive!(WhileDirective, "while", args, |arg| CodeFragment::open("while", arg));
directive!(EndWhileDirective, "endwhile", bare);
directive!(
    /// Opens a body that runs at least once; closed by `@dowhile(cond)`.
    DoDirective, "do", bare
);
directive!(DoWhileDirective, "dowhile", args, |arg| CodeFragment::open("dowhile", arg));
directive!(UppercaseDirective, "uppercase", args, |arg| {
    CodeFragment::echo(&format!("upper({})", arg))
});
directive!(LowercaseDirective, "lowercase", args, |arg| {
    CodeFragment::echo(&format!("lower({})", arg))
});
directive!(
    /// Pretty-printed JSON, unescaped.
    JsonDirective, "json", args, |arg| CodeFragment::echo(&format!("json({})", arg))
);
directive!(
    /// `@date(value)` or `@date(value, 'format')`, default format `Y-m-d`.
    DateDirective, "date", args, |arg| CodeFragment::echo(&format!("date({})", arg))
);
directive!(
    /// Same as `@date`, kept under its long name.
    DateFormatDirective, "dateformat", args, |arg| {
        CodeFragment::echo(&format!("date({})", arg))
    }
);
directive!(DumpDirective, "dump", args, |arg| CodeFragment::dump(arg));

/// Built-in directives in registration order.
pub fn builtin_directives() -> Vec<Arc<dyn Directive>> {
    vec![
        Arc::new(PhpDirective),
        Arc::new(IfDirective),
        Arc::new(ElseIfDirective),
        Arc::new(ElseDirective),
        Arc::new(EndIfDirective),
        Arc::new(ForeachDirective),
        Arc::new(EndForeachDirective),
        Arc::new(ForDirective),
        Arc::new(EndForDirective),
        Arc::new(WhileDirective),
        Arc::new(EndWhileDirective),
        Arc::new(DoDirective),
        Arc::new(DoWhileDirective),
        Arc::new(UppercaseDirective),
        Arc::new(LowercaseDirective),
        Arc::new(JsonDirective),
        Arc::new(DateDirective),
        Arc::new(DateFormatDirective),
        Arc::new(DumpDirective),
    ]
}

/// Register every built-in into `registry`. Fails on the first collision.
pub fn register_builtins(registry: &mut DirectiveRegistry) -> TemplateResult<()> {
    for directive in builtin_directives() {
        registry.register_directive(directive)?;
    }
    Ok(())
}

/// Registry holding exactly the built-in set.
pub fn create_default_registry() -> TemplateResult<DirectiveRegistry> {
    let mut registry = DirectiveRegistry::new();
    register_builtins(&mut registry)?;
    Ok(registry)
}
