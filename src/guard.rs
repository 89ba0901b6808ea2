/// Access guards for protected pages
///
/// Two gates, evaluated in order by a [`Guard`]:
/// * [`AuthGate`]: the session must hold a usable token, otherwise the user
///   is sent to the login page.
/// * [`RoleGate`]: the signed-in user must have the required role. A
///   mismatch shows an access-denied view instead of redirecting, since the
///   user is authenticated, just not authorized.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

use crate::api_client::ApiClient;
use crate::auth::{CurrentUser, SessionManager};
use crate::error::ApiError;

/// What a protected page should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardView {
    /// Checks still running
    Loading,
    /// Render the protected content
    Granted,
    /// Render nothing; navigation to this path was requested
    Redirect(String),
    /// Render the access-denied view
    Denied(AccessDenied),
}

impl GuardView {
    pub fn is_granted(&self) -> bool {
        matches!(self, GuardView::Granted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDenied {
    pub reason: DenialReason,
    pub actions: Vec<DeniedAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    /// The current user could not be fetched
    UserUnavailable,
    RoleMismatch { required: String, actual: String },
}

impl DenialReason {
    pub fn message(&self) -> String {
        match self {
            DenialReason::UserUnavailable => {
                "Unable to load your account. Please log in again.".to_string()
            }
            DenialReason::RoleMismatch { required, .. } => format!(
                "You do not have permission to access this page. Only {} users can access it.",
                required
            ),
        }
    }
}

/// Buttons offered on the access-denied view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeniedAction {
    GoHome,
    Logout,
    Relogin,
}

impl DeniedAction {
    pub fn perform(self, session: &SessionManager) {
        match self {
            DeniedAction::GoHome => session.go_home(),
            DeniedAction::Logout => session.logout(&session.routes().home),
            DeniedAction::Relogin => session.logout(&session.routes().login),
        }
    }
}

#[async_trait]
pub trait Gate: Send + Sync {
    fn name(&self) -> &'static str;

    async fn evaluate(&self) -> GuardView;
}

/// Passes when the session holds a valid (or refreshable) access token.
pub struct AuthGate {
    session: Arc<SessionManager>,
}

impl AuthGate {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Gate for AuthGate {
    fn name(&self) -> &'static str {
        "authentication"
    }

    async fn evaluate(&self) -> GuardView {
        if self.session.ensure_valid_token().await {
            return GuardView::Granted;
        }

        let login = self.session.routes().login.clone();
        self.session.navigator().replace(&login);
        GuardView::Redirect(login)
    }
}

/// Where the role gate gets the current user from
#[async_trait]
pub trait CurrentUserSource: Send + Sync {
    async fn current_user(&self) -> Result<CurrentUser, ApiError>;
}

#[async_trait]
impl CurrentUserSource for ApiClient {
    async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        ApiClient::current_user(self).await
    }
}

/// Passes when the current user has `required_role`.
pub struct RoleGate {
    users: Arc<dyn CurrentUserSource>,
    required_role: String,
}

impl RoleGate {
    pub fn new(users: Arc<dyn CurrentUserSource>, required_role: impl Into<String>) -> Self {
        Self {
            users,
            required_role: required_role.into(),
        }
    }
}

#[async_trait]
impl Gate for RoleGate {
    fn name(&self) -> &'static str {
        "role"
    }

    async fn evaluate(&self) -> GuardView {
        let user = match self.users.current_user().await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Error getting current user");
                return GuardView::Denied(AccessDenied {
                    reason: DenialReason::UserUnavailable,
                    actions: vec![DeniedAction::Relogin, DeniedAction::GoHome],
                });
            }
        };

        if user.has_role(&self.required_role) {
            return GuardView::Granted;
        }

        tracing::info!(
            user_id = %user.id,
            role = %user.role,
            required = %self.required_role,
            "Access denied: role mismatch"
        );
        GuardView::Denied(AccessDenied {
            reason: DenialReason::RoleMismatch {
                required: self.required_role.clone(),
                actual: user.role,
            },
            actions: vec![DeniedAction::GoHome, DeniedAction::Logout],
        })
    }
}

/// An ordered chain of gates and the view they currently produce
pub struct Guard {
    gates: Vec<Box<dyn Gate>>,
    view: Mutex<GuardView>,
}

impl Guard {
    pub fn new(gates: Vec<Box<dyn Gate>>) -> Self {
        Self {
            gates,
            view: Mutex::new(GuardView::Loading),
        }
    }

    /// Authentication first, then the role check.
    pub fn admin(session: Arc<SessionManager>, api: ApiClient, required_role: &str) -> Self {
        Self::new(vec![
            Box::new(AuthGate::new(session)),
            Box::new(RoleGate::new(Arc::new(api), required_role)),
        ])
    }

    /// The view to show right now: `Loading` until `evaluate` settles.
    pub fn view(&self) -> GuardView {
        self.view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run the gates in order; the first one that does not grant decides.
    pub async fn evaluate(&self) -> GuardView {
        self.set_view(GuardView::Loading);

        let mut outcome = GuardView::Granted;
        for gate in &self.gates {
            let view = gate.evaluate().await;
            tracing::debug!(gate = gate.name(), view = ?view, "Gate evaluated");
            if !view.is_granted() {
                outcome = view;
                break;
            }
        }

        self.set_view(outcome.clone());
        outcome
    }

    fn set_view(&self, view: GuardView) {
        *self.view.lock().unwrap_or_else(PoisonError::into_inner) = view;
    }
}
