//! Application state management for ticketdesk.
//!
//! This module contains the `App` struct holding the session context, the
//! current view, the account forms and the dashboard data. Every navigation
//! to a protected view goes through the route guard.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info, warn};

use ticketdesk_core::auth::Session;
use ticketdesk_core::dashboard::{menu_for, menu_items, DashboardSummary, MenuAction, MenuSection};
use ticketdesk_core::forms::{FormMessage, LoginForm, RegisterForm, ResetPasswordForm};
use ticketdesk_core::models::Role;
use ticketdesk_core::service::SESSION_EXPIRED_MESSAGE;
use ticketdesk_core::{
    ApiClient, AuthService, Config, GuardDecision, RegistrationOutcome, Route, RouteGuard,
    ServiceError,
};

// ============================================================================
// Constants
// ============================================================================

/// Delay before leaving the reset view after a successful reset.
const RESET_REDIRECT_DELAY: Duration = Duration::from_secs(2);

/// Roles offered by the dashboard role preview, in cycle order
const PREVIEW_ROLES: [Role; 3] = [Role::User, Role::Admin, Role::Manager];

// ============================================================================
// UI State Types
// ============================================================================

/// Overlay / modal state on top of the current view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingQuit,
    ConfirmingLogout,
    Quitting,
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    pub auth: AuthService,

    // UI State
    pub route: Route,
    pub state: AppState,
    pub status_message: Option<String>,

    // Forms
    pub login_form: LoginForm,
    pub register_form: RegisterForm,
    pub reset_form: ResetPasswordForm,

    // Dashboard
    pub dashboard: Option<DashboardSummary>,
    pub dashboard_error: Option<String>,
    pub menu_selection: usize,
    /// Role whose menu is being previewed; `None` shows the user's own menu
    pub preview_role: Option<Role>,

    /// Protected view requested while the session was still unresolved
    pending_route: Option<Route>,
    /// Navigate to login once this instant passes
    redirect_at: Option<Instant>,
}

impl App {
    /// Create a new application instance showing `start` once the session
    /// has been resolved.
    pub fn new(config: Config, start: Route) -> Result<Self> {
        let api = ApiClient::new(&config.api_url(), config.request_timeout())?;
        let session = Session::new(config.token_store()?, config.identity_source);
        Ok(Self::with_service(config, AuthService::new(api, session), start))
    }

    pub fn with_service(config: Config, auth: AuthService, start: Route) -> Self {
        // Get credentials from env vars or config
        let login_username = std::env::var("TICKETDESK_USERNAME")
            .ok()
            .or_else(|| config.last_username.clone())
            .unwrap_or_default();
        let login_password = std::env::var("TICKETDESK_PASSWORD").unwrap_or_default();

        let reset_token = match &start {
            Route::ResetPassword { token } => token.clone(),
            _ => None,
        };

        let mut app = Self {
            config,
            auth,

            route: Route::Login,
            state: AppState::Normal,
            status_message: None,

            login_form: LoginForm::new(&login_username, &login_password),
            register_form: RegisterForm::new(),
            reset_form: ResetPasswordForm::new(reset_token),

            dashboard: None,
            dashboard_error: None,
            menu_selection: 0,
            preview_role: None,

            pending_route: None,
            redirect_at: None,
        };
        app.navigate(start);
        app
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// True until the persisted session has been checked
    pub fn is_loading(&self) -> bool {
        self.auth.session().is_loading()
    }

    /// Resolve the persisted session, then finish any navigation that was
    /// waiting on it.
    pub async fn initialize(&mut self) {
        let status = self.auth.initialize().await;
        debug!(?status, "Session resolved");

        if let Some(route) = self.pending_route.take() {
            self.go(route).await;
        } else if self.route == Route::Login && self.auth.user().is_some() {
            // Already signed in; skip the login view
            self.go(Route::Dashboard).await;
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Navigate, consulting the guard for protected views.
    pub fn navigate(&mut self, route: Route) {
        if !route.is_protected() {
            debug!(path = route.path(), "Navigating");
            self.route = route;
            return;
        }

        match RouteGuard::authenticated().check(self.auth.status()) {
            GuardDecision::Admit => {
                debug!(path = route.path(), "Navigating");
                self.route = route;
            }
            GuardDecision::Wait => {
                debug!(path = route.path(), "Session unresolved, deferring navigation");
                self.pending_route = Some(route);
            }
            GuardDecision::Redirect(target) => {
                debug!(from = route.path(), to = target.path(), "Guard redirect");
                self.route = target;
            }
        }
    }

    /// Navigate and load whatever the new view needs.
    pub async fn go(&mut self, route: Route) {
        self.navigate(route);
        if self.route == Route::Dashboard {
            self.refresh_dashboard().await;
        }
    }

    /// Run time-based transitions (delayed redirects)
    pub fn tick(&mut self) {
        if let Some(at) = self.redirect_at {
            if Instant::now() >= at {
                self.redirect_at = None;
                self.reset_form = ResetPasswordForm::new(None);
                self.navigate(Route::Login);
            }
        }
    }

    /// Apply the redirect an error asks for, if any. Returns the message to show.
    fn handle_service_error(&mut self, e: &ServiceError) -> String {
        if let Some(route) = e.redirect() {
            info!(to = route.path(), "Session ended, redirecting");
            self.dashboard = None;
            self.preview_role = None;
            self.login_form.message = Some(FormMessage::error(SESSION_EXPIRED_MESSAGE));
            self.navigate(route);
        }
        e.user_message()
    }

    // =========================================================================
    // Forms
    // =========================================================================

    /// Submit the login form
    pub async fn submit_login(&mut self) {
        self.login_form.message = Some(FormMessage::info("Signing in..."));

        match self.auth.submit_login(&self.login_form).await {
            Ok(user) => {
                self.login_form.clear_password();
                self.login_form.message = None;
                self.config.last_username = user
                    .username
                    .clone()
                    .or_else(|| Some(self.login_form.username().trim().to_string()));
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                self.go(Route::Dashboard).await;
            }
            Err(e) => {
                if !e.is_validation() {
                    self.login_form.clear_password();
                }
                self.login_form.message = Some(FormMessage::error(e.user_message()));
            }
        }
    }

    /// Submit the registration form
    pub async fn submit_registration(&mut self) {
        match self.auth.submit_registration(&self.register_form).await {
            Ok(RegistrationOutcome::SignedIn(_)) => {
                self.register_form = RegisterForm::new();
                self.go(Route::Dashboard).await;
            }
            Ok(RegistrationOutcome::Registered) => {
                self.register_form = RegisterForm::new();
                self.login_form.message =
                    Some(FormMessage::success("Registration successful. Please log in."));
                self.navigate(Route::Login);
            }
            Err(e) => {
                if !e.is_validation() {
                    self.register_form.clear_passwords();
                }
                self.register_form.message = Some(FormMessage::error(e.user_message()));
            }
        }
    }

    /// Submit the password reset form. Mismatched passwords never reach the
    /// server.
    pub async fn submit_reset(&mut self) {
        let result = self.auth.submit_reset(&self.reset_form).await;
        let message = AuthService::reset_message(&result);

        match result {
            Ok(()) => {
                self.reset_form.clear_passwords();
                self.reset_form.message = Some(FormMessage::success(message));
                self.redirect_at = Some(Instant::now() + RESET_REDIRECT_DELAY);
            }
            Err(e) => {
                debug!(error = %e, "Password reset failed");
                self.reset_form.message = Some(FormMessage::error(message));
            }
        }
    }

    pub fn open_register(&mut self) {
        self.register_form.message = None;
        self.navigate(Route::Register);
    }

    pub fn open_reset(&mut self) {
        let token = self.reset_form.token.clone();
        self.reset_form = ResetPasswordForm::new(token);
        self.navigate(Route::ResetPassword {
            token: self.reset_form.token.clone(),
        });
    }

    /// Leave a secondary form for the login view
    pub fn back_to_login(&mut self) {
        self.redirect_at = None;
        self.navigate(Route::Login);
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Role whose menu is shown
    pub fn menu_role(&self) -> Role {
        self.preview_role
            .clone()
            .or_else(|| self.auth.user().map(|u| u.role()))
            .unwrap_or(Role::User)
    }

    pub fn menu_sections(&self) -> Vec<MenuSection> {
        menu_for(&self.menu_role())
    }

    pub fn menu_items(&self) -> Vec<MenuAction> {
        menu_items(&self.menu_role())
    }

    pub fn menu_up(&mut self) {
        self.menu_selection = self.menu_selection.saturating_sub(1);
    }

    pub fn menu_down(&mut self) {
        let last = self.menu_items().len().saturating_sub(1);
        self.menu_selection = (self.menu_selection + 1).min(last);
    }

    /// Cycle the previewed role: own role, then each preview role.
    pub fn cycle_preview_role(&mut self) {
        self.preview_role = match &self.preview_role {
            None => Some(PREVIEW_ROLES[0].clone()),
            Some(current) => PREVIEW_ROLES
                .iter()
                .position(|r| r == current)
                .and_then(|i| PREVIEW_ROLES.get(i + 1))
                .cloned(),
        };
        self.menu_selection = 0;
    }

    /// Reload the ticket summary through an authenticated call
    pub async fn refresh_dashboard(&mut self) {
        self.status_message = Some("Loading tickets...".to_string());
        match self.auth.list_tickets().await {
            Ok(tickets) => {
                if let Some(user) = self.auth.user() {
                    self.dashboard = Some(DashboardSummary::new(tickets, user));
                }
                self.dashboard_error = None;
                self.status_message = None;
            }
            Err(e) => {
                let message = self.handle_service_error(&e);
                warn!(error = %e, "Failed to load tickets");
                self.dashboard_error = Some(message);
                self.status_message = None;
            }
        }
    }

    /// Guard for a menu entry. Role-specific entries check the real role,
    /// not the previewed one.
    fn guard_for(action: MenuAction) -> RouteGuard {
        match action {
            MenuAction::UserManagement | MenuAction::Settings => RouteGuard::with_role(Role::Admin),
            MenuAction::Projects | MenuAction::Reports => RouteGuard::with_role(Role::Manager),
            _ => RouteGuard::authenticated(),
        }
    }

    /// Activate the selected menu entry
    pub async fn activate_menu_item(&mut self) {
        let Some(action) = self.menu_items().get(self.menu_selection).copied() else {
            return;
        };

        let guard = Self::guard_for(action);
        match guard.check(self.auth.status()) {
            GuardDecision::Admit => {}
            GuardDecision::Wait => return,
            GuardDecision::Redirect(route) => {
                if let (Route::Unauthorized, Some(role)) = (&route, guard.required_role()) {
                    self.status_message = Some(format!(
                        "{} requires the {} role",
                        action.label(),
                        role.display_name()
                    ));
                }
                self.navigate(route);
                return;
            }
        }

        match action {
            MenuAction::Dashboard => self.refresh_dashboard().await,
            MenuAction::Logout => self.state = AppState::ConfirmingLogout,
            other => {
                self.status_message = Some(format!("{} is not available yet", other.label()));
            }
        }
    }

    /// Local logout; returns to the login view
    pub fn logout(&mut self) {
        if let Err(e) = self.auth.logout() {
            warn!(error = %e, "Failed to clear persisted token");
        }
        self.dashboard = None;
        self.dashboard_error = None;
        self.preview_role = None;
        self.menu_selection = 0;
        self.status_message = None;
        self.login_form = LoginForm::new(self.config.last_username.as_deref().unwrap_or(""), "");
        self.navigate(Route::Login);
    }

    // =========================================================================
    // Line-mode commands
    // =========================================================================

    /// Interactive login (used for CLI mode)
    pub async fn login_interactive(&mut self) -> Result<()> {
        println!("\n=== ticketdesk login ===\n");

        let username = match self.config.last_username.clone() {
            Some(last_user) => {
                print!("Username [{}]: ", last_user);
                io::stdout().flush()?;
                let input = read_line()?;
                if input.is_empty() {
                    last_user
                } else {
                    input
                }
            }
            None => {
                print!("Username: ");
                io::stdout().flush()?;
                read_line()?
            }
        };
        let password = rpassword::prompt_password("Password: ")?;

        println!("\nAuthenticating...");
        self.login_form = LoginForm::new(&username, &password);
        let user = self
            .auth
            .submit_login(&self.login_form)
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;
        self.login_form.clear_password();

        self.config.last_username = Some(username);
        self.config.save()?;

        println!("Logged in as {}\n", user.display_name());
        Ok(())
    }
}

fn read_line() -> Result<String> {
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

// ============================================================================
// Tests
// ============================================================================
