use std::sync::Arc;

use crate::api_client::ApiClient;
use crate::auth::{
    BackgroundChecks, FileStorage, HttpAuthBackend, SessionManager, TokenStore,
};
use crate::configuration::Settings;
use crate::error::AppError;
use crate::guard::Guard;
use crate::navigation::Navigator;

/// Everything the session layer needs, built once at process start and
/// handed by reference to whatever needs it.
pub struct AppContext {
    pub settings: Settings,
    pub session: Arc<SessionManager>,
    pub api: ApiClient,
}

impl AppContext {
    pub fn build(settings: Settings, navigator: Arc<dyn Navigator>) -> Result<Self, AppError> {
        settings.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(settings.api.timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let store = match &settings.session.storage_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Persisting tokens to file");
                TokenStore::new(Arc::new(FileStorage::new(path)))
            }
            None => TokenStore::in_memory(),
        };

        let backend = Arc::new(HttpAuthBackend::new(
            settings.api.base_url.clone(),
            http_client.clone(),
        ));

        let session = Arc::new(
            SessionManager::new(store, backend, navigator)
                .with_expiry_skew(settings.session.expiry_skew_seconds)
                .with_routes(settings.routes.clone()),
        );

        let api = ApiClient::new(settings.api.base_url.clone(), http_client, session.clone());

        Ok(Self {
            settings,
            session,
            api,
        })
    }

    /// Periodic token checks at the configured interval.
    pub fn start_background_checks(&self) -> BackgroundChecks {
        self.session
            .start_background_checks(self.settings.session.check_interval())
    }

    /// Guard for the admin area: valid session, then the configured role.
    pub fn admin_guard(&self) -> Guard {
        Guard::admin(
            self.session.clone(),
            self.api.clone(),
            &self.settings.guard.required_role,
        )
    }
}
