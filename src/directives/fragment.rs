use std::fmt;

/// Opening delimiter of an instruction tag.
pub const OPEN_TAG: &str = "<?tpl";
/// Closing delimiter of an instruction tag.
pub const CLOSE_TAG: &str = "?>";

/// Text that replaces a directive match in the artifact.
///
/// Usually an instruction tag `<?tpl KEYWORD ARGS ?>`, but a handler may
/// return plain literal text as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CodeFragment(String);

impl CodeFragment {
    /// `<?tpl BODY ?>`
    pub fn instruction(body: impl AsRef<str>) -> Self {
        CodeFragment(format!("{} {} {}", OPEN_TAG, body.as_ref().trim(), CLOSE_TAG))
    }

    /// Literal text, emitted as-is.
    pub fn text(text: impl Into<String>) -> Self {
        CodeFragment(text.into())
    }

    /// Escaped output of an expression.
    pub fn print(expr: &str) -> Self {
        Self::open("print", expr)
    }

    /// Raw (unescaped) output of an expression.
    pub fn echo(expr: &str) -> Self {
        Self::open("echo", expr)
    }

    pub fn dump(expr: &str) -> Self {
        Self::open("dump", expr)
    }

    pub fn exec(statements: &str) -> Self {
        Self::open("exec", statements)
    }

    /// Keyword followed by its header.
    pub fn open(keyword: &str, header: &str) -> Self {
        Self::instruction(format!("{} {}", keyword, header.trim()))
    }

    /// Bare keyword such as `else` or `endif`.
    pub fn keyword(keyword: &str) -> Self {
        Self::instruction(keyword)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CodeFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CodeFragment {
    fn from(text: String) -> Self {
        CodeFragment(text)
    }
}

impl From<&str> for CodeFragment {
    fn from(text: &str) -> Self {
        CodeFragment(text.to_string())
    }
}
