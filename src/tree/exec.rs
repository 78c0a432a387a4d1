//! Resumable step-wise execution over a tree arena.
//!
//! The executor keeps an explicit stack of frames, one per control node
//! being run. A tick descends until one action terminal fires and leaves the
//! stack in place, so the next tick picks up right after that action.

use strum::{Display, EnumString};
use tracing::trace;

use crate::node::scope::StepBudget;
use crate::node::{ExecMode, NodeResult, Scope};
use crate::tree::arena::NodeArena;

/// Whether a program is part-way through an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecStatus {
    #[default]
    Exited,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    index: u32,
    visits: usize,
}

#[derive(Debug, Default)]
pub(crate) struct ExecStack {
    frames: Vec<Frame>,
}

impl ExecStack {
    pub(crate) fn status(&self) -> ExecStatus {
        if self.frames.is_empty() {
            ExecStatus::Exited
        } else {
            ExecStatus::Running
        }
    }

    pub(crate) fn clear(&mut self) {
        self.frames.clear();
    }

    /// Runs until one action fires or the program exits. Returns the slot of
    /// the action that fired, if any. An exited stack restarts at the root.
    pub(crate) fn tick<A>(
        &mut self,
        arena: &NodeArena<A>,
        agent: &mut A,
        budget: &mut StepBudget,
    ) -> NodeResult<Option<u32>> {
        if self.frames.is_empty() {
            self.frames.push(Frame { index: 0, visits: 0 });
        }

        while let Some(&Frame { index, visits }) = self.frames.last() {
            let behavior = &arena.slot(index).behavior;
            match behavior.exec_mode() {
                mode @ (ExecMode::Action | ExecMode::Atomic) => {
                    Scope::new(arena, index, &mut *agent, &mut *budget).run()?;
                    self.frames.pop();
                    if mode == ExecMode::Action {
                        trace!(node = index, "action fired");
                        return Ok(Some(index));
                    }
                }
                ExecMode::Resumable => {
                    if visits == 0 {
                        budget.charge()?;
                    }
                    let mut scope = Scope::new(arena, index, &mut *agent, &mut *budget);
                    match behavior.next_child(visits, &mut scope)? {
                        Some(position) => {
                            let child = scope.child_index(position)?;
                            if let Some(top) = self.frames.last_mut() {
                                top.visits += 1;
                            }
                            self.frames.push(Frame { index: child, visits: 0 });
                        }
                        None => {
                            self.frames.pop();
                        }
                    }
                }
            }
        }
        Ok(None)
    }
}
