//! Pure transition rules for the three order state machines.
//!
//! The functions here never touch the database: they validate a requested
//! transition against the allowed predecessor set and return the follow-up
//! effects (stock consumption, lot creation, timestamp stamping) for the
//! calling service to apply inside a single transaction.

pub mod production;
pub mod purchase;
pub mod sales;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot transition from status '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    #[error("order in terminal status '{status}' accepts no further changes")]
    Terminal { status: String },
}

impl TransitionError {
    pub(crate) fn invalid(from: impl ToString, to: impl ToString) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub(crate) fn terminal(status: impl ToString) -> Self {
        Self::Terminal {
            status: status.to_string(),
        }
    }
}
