use std::fmt;

/// How many children a node of a category requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// Exactly this many children. `Fixed(0)` marks a terminal.
    Fixed(usize),
    /// Any non-zero number of children, as dictated by the production chosen.
    Variable,
}

impl Arity {
    pub const TERMINAL: Arity = Arity::Fixed(0);

    pub fn is_terminal(&self) -> bool {
        matches!(self, Arity::Fixed(0))
    }

    /// Whether a production with `len` children can be attached to a node of this arity.
    pub fn accepts(&self, len: usize) -> bool {
        match self {
            Arity::Fixed(n) => *n == len,
            Arity::Variable => len > 0,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{}", n),
            Arity::Variable => write!(f, "variable"),
        }
    }
}
