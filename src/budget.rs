//! Deadline and step budgets for traversal-bearing operations.
//!
//! Every operation that walks the graph charges its [`Budget`] per expanded
//! node. When the budget runs out the operation aborts with a budget error
//! instead of returning a silently truncated answer: partial success is
//! never reported as completion.

use std::time::{Duration, Instant};

use crate::error::BudgetError;

/// A per-request work budget: an optional wall-clock deadline and an
/// optional traversal-step ceiling. The default budget is unlimited.
#[derive(Debug, Clone)]
pub struct Budget {
    started: Instant,
    deadline: Option<Instant>,
    max_steps: Option<u64>,
    steps: u64,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            started: Instant::now(),
            deadline: None,
            max_steps: None,
            steps: 0,
        }
    }
}

impl Budget {
    /// An unlimited budget.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Bound the request by a wall-clock deadline from now.
    pub fn with_deadline(mut self, timeout: Duration) -> Self {
        self.deadline = Some(self.started + timeout);
        self
    }

    /// Bound the request by a maximum number of traversal steps.
    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Charge one traversal step and check both bounds.
    pub fn charge(&mut self) -> Result<(), BudgetError> {
        self.steps += 1;
        if let Some(max) = self.max_steps
            && self.steps > max
        {
            return Err(BudgetError::StepsExhausted { max_steps: max });
        }
        if let Some(deadline) = self.deadline {
            let now = Instant::now();
            if now > deadline {
                return Err(BudgetError::DeadlineExceeded {
                    elapsed_ms: (now - self.started).as_millis() as u64,
                });
            }
        }
        Ok(())
    }

    /// Steps consumed so far.
    pub fn steps_used(&self) -> u64 {
        self.steps
    }
}
