//! Task stage machine
//!
//! Pure transition rules for field-work tickets. The repository layer calls
//! into this module before touching the database, so an illegal transition
//! never reaches a query.
//!
//! ```text
//! pending ──assign──▶ assigned ──accept──▶ accepted ──▶ arrived ──▶ completed
//!     │                   │                    │            │
//!     ├──────accept───────┘                    │            │
//!     └────────────── cancel (any active stage) ────────────┘──▶ cancelled
//! ```
//!
//! A technician may accept straight from `pending` (self-service pickup of
//! an unassigned ticket); the one-active-task rule applies either way.
//!
//! `in_progress` exists in the stage set for historical records but no
//! transition produces it.

use thiserror::Error;

use crate::db::models::TaskStage;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Cannot move task from {from} to {to}")]
    InvalidTransition { from: &'static str, to: &'static str },

    #[error("Technician already has an active task")]
    ActiveTaskExists,
}

pub type DispatchResult<T> = Result<T, DispatchError>;

/// Stages that occupy a technician's single active slot. `arrived` is
/// deliberately outside the set: a technician on site may already pick up
/// the next ticket.
pub fn is_active(stage: TaskStage) -> bool {
    matches!(
        stage,
        TaskStage::Assigned | TaskStage::Accepted | TaskStage::InProgress
    )
}

/// The active stages as SQL-bindable names, derived from [`is_active`]
pub fn active_stage_names() -> Vec<String> {
    [
        TaskStage::Pending,
        TaskStage::Assigned,
        TaskStage::Accepted,
        TaskStage::InProgress,
        TaskStage::Arrived,
        TaskStage::Completed,
        TaskStage::Cancelled,
    ]
    .into_iter()
    .filter(|s| is_active(*s))
    .map(|s| s.as_str().to_string())
    .collect()
}

/// Stages that end the ticket
pub fn is_terminal(stage: TaskStage) -> bool {
    matches!(stage, TaskStage::Completed | TaskStage::Cancelled)
}

/// Assign a pending (or re-assign an assigned) task to a technician
pub fn assign(from: TaskStage) -> DispatchResult<TaskStage> {
    match from {
        TaskStage::Pending | TaskStage::Assigned => Ok(TaskStage::Assigned),
        _ => Err(DispatchError::InvalidTransition {
            from: from.as_str(),
            to: TaskStage::Assigned.as_str(),
        }),
    }
}

/// Technician accepts a task, either assigned to them or picked up from
/// the pending pool
pub fn accept(from: TaskStage) -> DispatchResult<TaskStage> {
    match from {
        TaskStage::Pending | TaskStage::Assigned => Ok(TaskStage::Accepted),
        _ => Err(DispatchError::InvalidTransition {
            from: from.as_str(),
            to: TaskStage::Accepted.as_str(),
        }),
    }
}

/// Forward progress after acceptance: accepted → arrived → completed
pub fn advance(from: TaskStage, to: TaskStage) -> DispatchResult<TaskStage> {
    let ok = matches!(
        (from, to),
        (TaskStage::Accepted, TaskStage::Arrived)
            | (TaskStage::Arrived, TaskStage::Completed)
    );
    if ok {
        Ok(to)
    } else {
        Err(DispatchError::InvalidTransition {
            from: from.as_str(),
            to: to.as_str(),
        })
    }
}

/// Cancel any non-terminal task
pub fn cancel(from: TaskStage) -> DispatchResult<TaskStage> {
    if is_terminal(from) {
        return Err(DispatchError::InvalidTransition {
            from: from.as_str(),
            to: TaskStage::Cancelled.as_str(),
        });
    }
    Ok(TaskStage::Cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let s = assign(TaskStage::Pending).unwrap();
        let s = accept(s).unwrap();
        let s = advance(s, TaskStage::Arrived).unwrap();
        let s = advance(s, TaskStage::Completed).unwrap();
        assert_eq!(s, TaskStage::Completed);
        assert!(is_terminal(s));
    }

    #[test]
    fn reassignment_allowed_before_accept() {
        assert_eq!(assign(TaskStage::Assigned).unwrap(), TaskStage::Assigned);
        assert!(assign(TaskStage::Accepted).is_err());
    }

    #[test]
    fn accept_from_pending_or_assigned_only() {
        assert_eq!(accept(TaskStage::Pending).unwrap(), TaskStage::Accepted);
        assert_eq!(accept(TaskStage::Assigned).unwrap(), TaskStage::Accepted);
        assert!(accept(TaskStage::Accepted).is_err());
        assert!(accept(TaskStage::Arrived).is_err());
        assert!(accept(TaskStage::Completed).is_err());
    }

    #[test]
    fn no_stage_skipping() {
        assert!(advance(TaskStage::Accepted, TaskStage::Completed).is_err());
        assert!(advance(TaskStage::Assigned, TaskStage::Arrived).is_err());
    }

    #[test]
    fn no_backward_movement() {
        assert!(advance(TaskStage::Arrived, TaskStage::Accepted).is_err());
        assert!(advance(TaskStage::Completed, TaskStage::Arrived).is_err());
    }

    #[test]
    fn cancel_from_any_active_stage() {
        for stage in [
            TaskStage::Pending,
            TaskStage::Assigned,
            TaskStage::Accepted,
            TaskStage::Arrived,
            TaskStage::InProgress,
        ] {
            assert_eq!(cancel(stage).unwrap(), TaskStage::Cancelled);
        }
    }

    #[test]
    fn terminal_stages_are_frozen() {
        assert!(cancel(TaskStage::Completed).is_err());
        assert!(cancel(TaskStage::Cancelled).is_err());
    }

    #[test]
    fn active_slot_is_assigned_accepted_in_progress() {
        assert!(is_active(TaskStage::Assigned));
        assert!(is_active(TaskStage::Accepted));
        assert!(is_active(TaskStage::InProgress));
        assert!(!is_active(TaskStage::Pending));
        assert!(!is_active(TaskStage::Arrived));
        assert!(!is_active(TaskStage::Completed));
        assert_eq!(
            active_stage_names(),
            vec!["assigned", "accepted", "in_progress"]
        );
    }
}
