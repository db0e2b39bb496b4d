use lasso::{Spur, ThreadedRodeo};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for tag and attribute names.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// An interned tag or attribute name (`g`, `path`, `clip-path`, ...).
/// Internally a `Spur` index: 4 bytes, Copy, Eq, Hash in O(1).
///
/// Generated SVG repeats a handful of names thousands of times, so nodes
/// store these instead of owned strings.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Name(Spur);

impl Name {
    /// Intern a string as a `Name`, or return the existing one.
    pub fn intern(s: &str) -> Self {
        Name(INTERNER.get_or_intern(s))
    }

    /// Look up an already-interned name without growing the interner.
    pub fn get(s: &str) -> Option<Self> {
        INTERNER.get(s).map(Name)
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
