use thiserror::Error;

use crate::timecard::card::TimecardStatus;

/// Command attempted in a lifecycle state that does not allow it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Edit,
    Submit,
    Approve,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimecardError {
    /// The request itself is unusable (no days, empty patch, ...)
    #[error("{0}")]
    Validation(String),

    #[error("{}", transition_message(.action, .status))]
    IllegalTransition {
        status: TimecardStatus,
        action: Action,
    },

    #[error("{0}")]
    Forbidden(String),
}

fn transition_message(action: &Action, status: &TimecardStatus) -> String {
    match action {
        Action::Edit => format!("Timecard locked ({status})"),
        Action::Submit => "Already submitted".to_string(),
        Action::Approve => format!("Must be submitted (currently {status})"),
    }
}

pub type TimecardResult<T> = Result<T, TimecardError>;
