/// Session Manager
///
/// Owns the token pair for the whole process. Decides whether the stored
/// access token is still usable and coordinates refreshes so that at most
/// one refresh call is in flight at any time; concurrent callers share its
/// outcome. Refresh tokens rotate on every use, so two parallel refreshes
/// would invalidate each other.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, PoisonError};

use crate::auth::backend::AuthBackend;
use crate::auth::claims::{self, DEFAULT_EXPIRY_SKEW_SECONDS};
use crate::auth::login::{LoginForm, LoginOutcome, DEFAULT_LOGIN_ERROR};
use crate::auth::token_store::TokenStore;
use crate::configuration::{RouteSettings, Settings};
use crate::error::{ApiError, AppError, AuthError, ErrorContext};
use crate::navigation::Navigator;

type PendingRefresh = Shared<BoxFuture<'static, bool>>;

pub struct SessionManager {
    store: TokenStore,
    backend: Arc<dyn AuthBackend>,
    navigator: Arc<dyn Navigator>,
    routes: RouteSettings,
    expiry_skew_seconds: i64,
    in_flight: Arc<Mutex<Option<PendingRefresh>>>,
}

impl SessionManager {
    pub fn new(
        store: TokenStore,
        backend: Arc<dyn AuthBackend>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            store,
            backend,
            navigator,
            routes: Settings::default().routes,
            expiry_skew_seconds: DEFAULT_EXPIRY_SKEW_SECONDS,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_expiry_skew(mut self, seconds: i64) -> Self {
        self.expiry_skew_seconds = seconds;
        self
    }

    pub fn with_routes(mut self, routes: RouteSettings) -> Self {
        self.routes = routes;
        self
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn routes(&self) -> &RouteSettings {
        &self.routes
    }

    pub fn navigator(&self) -> &dyn Navigator {
        self.navigator.as_ref()
    }

    pub fn access_token(&self) -> Option<String> {
        self.store.access_token()
    }

    /// Quick check that an access token is stored. Does not look at expiry.
    pub fn is_authenticated(&self) -> bool {
        self.store.access_token().is_some()
    }

    /// Whether a refresh is currently in flight
    pub fn is_refreshing(&self) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Make sure a usable access token is stored, refreshing it if it has
    /// expired or is about to. Never fails: every failure path yields `false`.
    pub async fn ensure_valid_token(&self) -> bool {
        let Some(token) = self.store.access_token() else {
            tracing::debug!("No access token stored");
            return false;
        };

        if !claims::is_expired(&token, self.expiry_skew_seconds) {
            return true;
        }

        tracing::debug!("Access token expired or about to expire, refreshing");
        self.refresh().await
    }

    /// Exchange the stored refresh token for a new pair.
    ///
    /// If a refresh is already running, waits for it instead of starting
    /// another. The refresh runs on its own task: it completes and writes the
    /// new pair even when every caller has stopped waiting. On failure the
    /// stored tokens are left as they were.
    pub async fn refresh(&self) -> bool {
        let pending = {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(pending) => {
                    tracing::debug!("Refresh already in flight, waiting for it");
                    pending.clone()
                }
                None => {
                    // The slot stays locked until the new future is stored, so
                    // the task cannot clear it before it is set.
                    let task = tokio::spawn(run_refresh(
                        self.store.clone(),
                        Arc::clone(&self.backend),
                        Arc::clone(&self.in_flight),
                    ));
                    let pending = async move {
                        task.await.unwrap_or_else(|e| {
                            tracing::error!(error = %e, "Refresh task failed");
                            false
                        })
                    }
                    .boxed()
                    .shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Log in with the form contents and store the returned token pair.
    ///
    /// Errors carry the message to show next to the form: the server's own
    /// message when it gave one.
    pub async fn login(&self, form: &LoginForm) -> Result<LoginOutcome, AppError> {
        let request = form.validate()?;
        let context = ErrorContext::new("user_login");

        let response = match self.backend.login(&request).await {
            Ok(response) => response,
            Err(e @ (ApiError::Timeout | ApiError::Network(_))) => {
                context.log_api_error(&e);
                return Err(AuthError::ServerUnreachable.into());
            }
            Err(e) => {
                tracing::warn!(request_id = %context.request_id, error = %e, "Login rejected");
                let message = e.server_message().unwrap_or(DEFAULT_LOGIN_ERROR).to_string();
                return Err(AuthError::InvalidCredentials(message).into());
            }
        };

        if !self.store.set(&response.tokens) {
            tracing::warn!(request_id = %context.request_id, "Token storage unavailable, session will not persist");
        }

        let outcome = LoginOutcome::new(response.user, &self.routes.home, &self.routes.admin);
        tracing::info!(
            request_id = %context.request_id,
            role = outcome.role.as_deref().unwrap_or_default(),
            "User logged in successfully"
        );
        Ok(outcome)
    }

    /// Remove both tokens, then navigate to `redirect`.
    pub fn logout(&self, redirect: &str) {
        self.store.clear();
        tracing::info!(redirect = redirect, "Logged out");
        self.navigator.navigate(redirect);
    }

    pub fn go_home(&self) {
        self.navigator.navigate(&self.routes.home);
    }
}

async fn run_refresh(
    store: TokenStore,
    backend: Arc<dyn AuthBackend>,
    in_flight: Arc<Mutex<Option<PendingRefresh>>>,
) -> bool {
    let refreshed = refresh_tokens(&store, backend.as_ref()).await;
    *in_flight.lock().unwrap_or_else(PoisonError::into_inner) = None;
    refreshed
}

async fn refresh_tokens(store: &TokenStore, backend: &dyn AuthBackend) -> bool {
    let Some(refresh_token) = store.refresh_token() else {
        tracing::info!("No refresh token stored, cannot refresh");
        return false;
    };

    let context = ErrorContext::new("token_refresh");
    match backend.refresh(&refresh_token).await {
        Ok(pair) => {
            if store.set(&pair) {
                tracing::info!(request_id = %context.request_id, "Token refreshed successfully");
                true
            } else {
                tracing::warn!(request_id = %context.request_id, "Refreshed tokens could not be stored");
                false
            }
        }
        Err(e) => {
            tracing::warn!(request_id = %context.request_id, error = %e, "Error refreshing token");
            false
        }
    }
}
