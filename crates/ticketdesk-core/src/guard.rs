//! Route guard for protected views.
//!
//! The decision is synchronous and based only on the current session status.
//! While the session is still being restored the guard answers `Wait`, so a
//! returning user is never bounced to the login view before their persisted
//! token has been checked.

use crate::auth::SessionStatus;
use crate::models::Role;
use crate::route::Route;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the protected content.
    Admit,
    /// Session not resolved yet; show a loading state and ask again later.
    Wait,
    /// Navigate elsewhere instead.
    Redirect(Route),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteGuard {
    required_role: Option<Role>,
}

impl RouteGuard {
    /// Guard that only requires an authenticated user
    pub fn authenticated() -> Self {
        Self { required_role: None }
    }

    pub fn with_role(role: Role) -> Self {
        Self {
            required_role: Some(role),
        }
    }

    pub fn required_role(&self) -> Option<&Role> {
        self.required_role.as_ref()
    }

    pub fn check(&self, status: &SessionStatus) -> GuardDecision {
        match status {
            SessionStatus::Unresolved => GuardDecision::Wait,
            SessionStatus::Anonymous => GuardDecision::Redirect(Route::Login),
            SessionStatus::Authenticated(user) => match &self.required_role {
                Some(required) if !user.has_role(required) => {
                    GuardDecision::Redirect(Route::Unauthorized)
                }
                _ => GuardDecision::Admit,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn user_with(role: Option<Role>) -> SessionStatus {
        SessionStatus::Authenticated(User {
            id: 1,
            username: Some("u".to_string()),
            email: None,
            role,
            first_name: None,
            last_name: None,
            is_active: true,
        })
    }

    #[test]
    fn test_unresolved_waits() {
        assert_eq!(
            RouteGuard::authenticated().check(&SessionStatus::Unresolved),
            GuardDecision::Wait
        );
        assert_eq!(
            RouteGuard::with_role(Role::Admin).check(&SessionStatus::Unresolved),
            GuardDecision::Wait
        );
    }

    #[test]
    fn test_anonymous_redirects_to_login() {
        assert_eq!(
            RouteGuard::authenticated().check(&SessionStatus::Anonymous),
            GuardDecision::Redirect(Route::Login)
        );
        assert_eq!(
            RouteGuard::with_role(Role::Manager).check(&SessionStatus::Anonymous),
            GuardDecision::Redirect(Route::Login)
        );
    }

    #[test]
    fn test_authenticated_admitted() {
        assert_eq!(
            RouteGuard::authenticated().check(&user_with(None)),
            GuardDecision::Admit
        );
    }

    #[test]
    fn test_role_requirements() {
        let guard = RouteGuard::with_role(Role::Manager);
        assert_eq!(guard.check(&user_with(Some(Role::Manager))), GuardDecision::Admit);
        assert_eq!(guard.check(&user_with(Some(Role::Admin))), GuardDecision::Admit);
        assert_eq!(
            guard.check(&user_with(Some(Role::User))),
            GuardDecision::Redirect(Route::Unauthorized)
        );
        assert_eq!(
            guard.check(&user_with(None)),
            GuardDecision::Redirect(Route::Unauthorized)
        );
    }
}
