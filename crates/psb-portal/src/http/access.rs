//! Role gates for the protected route groups.
//!
//! Each endpoint names exactly one [`Capability`] through the extractor it takes. Missing or
//! invalid sessions fail with 401 before any role is looked at.

use std::marker::PhantomData;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::warn;

use super::error::ApiError;
use super::session::CurrentUser;
use super::AppState;
use crate::schema::{Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ApplicantSelfService,
    AdminConsole,
    BoardReview,
}

impl Capability {
    pub fn admits(self, role: Role) -> bool {
        match (self, role) {
            (Capability::ApplicantSelfService, Role::Applicant) => true,
            (Capability::AdminConsole, Role::Admin) => true,
            (Capability::BoardReview, Role::Board) => true,
            (Capability::ApplicantSelfService, Role::Admin | Role::Board)
            | (Capability::AdminConsole, Role::Applicant | Role::Board)
            | (Capability::BoardReview, Role::Applicant | Role::Admin) => false,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Capability::ApplicantSelfService => "applicant",
            Capability::AdminConsole => "admin",
            Capability::BoardReview => "board",
        }
    }
}

pub trait Gate: Send + Sync + 'static {
    const CAPABILITY: Capability;
}

#[derive(Debug)]
pub struct ApplicantGate;
#[derive(Debug)]
pub struct AdminGate;
#[derive(Debug)]
pub struct BoardGate;

impl Gate for ApplicantGate {
    const CAPABILITY: Capability = Capability::ApplicantSelfService;
}

impl Gate for AdminGate {
    const CAPABILITY: Capability = Capability::AdminConsole;
}

impl Gate for BoardGate {
    const CAPABILITY: Capability = Capability::BoardReview;
}

/// A signed-in user whose role holds `G`'s capability.
#[derive(Debug)]
pub struct Access<G> {
    pub user: User,
    gate: PhantomData<G>,
}

impl<G> Access<G> {
    pub fn role(&self) -> Role {
        self.user.role
    }
}

pub type ApplicantAccess = Access<ApplicantGate>;
pub type AdminAccess = Access<AdminGate>;
pub type BoardAccess = Access<BoardGate>;

#[axum::async_trait]
impl<G: Gate> FromRequestParts<AppState> for Access<G> {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !G::CAPABILITY.admits(user.role) {
            warn!(
                user_id = %user.id,
                role = %user.role,
                required = G::CAPABILITY.label(),
                path = %parts.uri.path(),
                "access denied"
            );
            return Err(ApiError::Forbidden);
        }
        Ok(Access {
            user,
            gate: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_capability_admits_exactly_one_role() {
        let roles = [Role::Applicant, Role::Admin, Role::Board];
        for capability in [
            Capability::ApplicantSelfService,
            Capability::AdminConsole,
            Capability::BoardReview,
        ] {
            let admitted: Vec<Role> = roles
                .into_iter()
                .filter(|role| capability.admits(*role))
                .collect();
            assert_eq!(admitted.len(), 1, "{capability:?}");
        }
        assert!(!Capability::AdminConsole.admits(Role::Board));
    }
}
