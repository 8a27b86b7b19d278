use std::collections::VecDeque;

use super::types::Directive;

/// Directives produced by the server since the last `ServerData` was sent.
#[derive(Debug, Default)]
pub struct DirectiveQueue {
    pending: VecDeque<Directive>,
}

impl DirectiveQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, directive: Directive) {
        self.pending.push_back(directive);
    }

    /// Drains everything queued, oldest first.
    pub fn take_all(&mut self) -> Vec<Directive> {
        self.pending.drain(..).collect()
    }
}
