use strum::{Display, EnumString};

/// Lifecycle of a [`ProgramTree`](crate::tree::ProgramTree).
///
/// Transitions only move forward: `EMPTY -> IN_PROGRESS -> COMPLETE -> BOUND`.
/// A successfully built tree may be rebuilt, which passes through
/// `IN_PROGRESS` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TreeStatus {
    #[default]
    Empty,
    InProgress,
    Complete,
    Bound,
}

impl TreeStatus {
    /// Whether the tree holds a fully decoded structure.
    pub fn has_structure(&self) -> bool {
        matches!(self, TreeStatus::Complete | TreeStatus::Bound)
    }
}
