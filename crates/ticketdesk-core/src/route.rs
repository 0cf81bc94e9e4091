//! Views the client can navigate between.

/// A navigable view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    /// Password reset, carrying the token from the reset link if one was given.
    ResetPassword { token: Option<String> },
    Dashboard,
    Unauthorized,
}

impl Route {
    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Register => "Register",
            Route::ResetPassword { .. } => "Reset Password",
            Route::Dashboard => "Dashboard",
            Route::Unauthorized => "Unauthorized",
        }
    }

    /// Views that require an authenticated session.
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Dashboard)
    }

    /// Path form used in logs and the title bar
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::ResetPassword { .. } => "/reset-password",
            Route::Dashboard => "/dashboard",
            Route::Unauthorized => "/unauthorized",
        }
    }
}
