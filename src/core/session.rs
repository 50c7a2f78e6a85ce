//! Working-directory state
//!
//! A session is just a handle to its current directory. The filesystem takes
//! the session as an argument on every verb, so several sessions can work on
//! the same tree side by side.

use crate::core::tree::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    cwd: NodeId,
}

impl Session {
    pub(crate) fn new(cwd: NodeId) -> Self {
        Session { cwd }
    }

    /// Handle of the current directory
    ///
    /// The node may have been removed through another session; the
    /// filesystem reports that as `NotFound` when the session is used.
    pub fn cwd(&self) -> NodeId {
        self.cwd
    }

    pub(crate) fn set_cwd(&mut self, cwd: NodeId) {
        self.cwd = cwd;
    }
}
