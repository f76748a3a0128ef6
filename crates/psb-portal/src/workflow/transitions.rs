use serde::{Deserialize, Serialize};

use crate::schema::{ApplicationStatus, Role};

/// Something an actor does to an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Submit,
    Shortlist,
    RecordInterview,
    Reject,
    Hire,
}

impl ReviewAction {
    pub const fn label(self) -> &'static str {
        match self {
            ReviewAction::Submit => "submit",
            ReviewAction::Shortlist => "shortlist",
            ReviewAction::RecordInterview => "record interview",
            ReviewAction::Reject => "reject",
            ReviewAction::Hire => "hire",
        }
    }

    /// The action whose success lands an application in `status`. Nothing leads back to draft.
    pub const fn targeting(status: ApplicationStatus) -> Option<ReviewAction> {
        match status {
            ApplicationStatus::Draft => None,
            ApplicationStatus::Submitted => Some(ReviewAction::Submit),
            ApplicationStatus::Shortlisted => Some(ReviewAction::Shortlist),
            ApplicationStatus::Interviewed => Some(ReviewAction::RecordInterview),
            ApplicationStatus::Rejected => Some(ReviewAction::Reject),
            ApplicationStatus::Hired => Some(ReviewAction::Hire),
        }
    }

    pub const fn permits(self, actor: Role) -> bool {
        match (self, actor) {
            (ReviewAction::Submit, Role::Applicant) => true,
            (ReviewAction::Submit, Role::Admin | Role::Board) => false,
            (ReviewAction::Shortlist | ReviewAction::RecordInterview, Role::Board) => true,
            (ReviewAction::Shortlist | ReviewAction::RecordInterview, Role::Applicant | Role::Admin) => {
                false
            }
            (ReviewAction::Reject | ReviewAction::Hire, Role::Board | Role::Admin) => true,
            (ReviewAction::Reject | ReviewAction::Hire, Role::Applicant) => false,
        }
    }
}

impl std::fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Cannot {action} an application that is {from}")]
    IllegalTransition {
        from: ApplicationStatus,
        action: ReviewAction,
    },
    #[error("The {actor} role may not {action} an application")]
    ActorNotPermitted { actor: Role, action: ReviewAction },
    #[error("An application can never be moved to {0}")]
    Unreachable(ApplicationStatus),
}

/// Resolve `(current, action, actor)` against the status table.
///
/// Legality is judged before permission: a board member shortlisting a hired application
/// gets `IllegalTransition`, an admin shortlisting a submitted one gets `ActorNotPermitted`.
pub fn next_status(
    current: ApplicationStatus,
    action: ReviewAction,
    actor: Role,
) -> Result<ApplicationStatus, TransitionError> {
    use ApplicationStatus::*;

    let next = match (current, action) {
        (Draft, ReviewAction::Submit) => Submitted,
        (Submitted, ReviewAction::Shortlist) => Shortlisted,
        (Shortlisted, ReviewAction::RecordInterview) => Interviewed,
        (Submitted | Shortlisted | Interviewed, ReviewAction::Reject) => Rejected,
        (Interviewed, ReviewAction::Hire) => Hired,
        _ => {
            return Err(TransitionError::IllegalTransition {
                from: current,
                action,
            })
        }
    };

    if !action.permits(actor) {
        return Err(TransitionError::ActorNotPermitted { actor, action });
    }

    Ok(next)
}

/// Like [`next_status`] but keyed by the requested destination status.
pub fn transition_to(
    current: ApplicationStatus,
    target: ApplicationStatus,
    actor: Role,
) -> Result<(ReviewAction, ApplicationStatus), TransitionError> {
    let action = ReviewAction::targeting(target).ok_or(TransitionError::Unreachable(target))?;
    next_status(current, action, actor).map(|next| (action, next))
}
