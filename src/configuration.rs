use crate::error::{AppError, ConfigError};
use std::path::PathBuf;
use std::time::Duration;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub api: ApiSettings,
    pub session: SessionSettings,
    pub routes: RouteSettings,
    pub guard: GuardSettings,
}

/// Remote REST API settings
#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_seconds: u64, // client-side timeout for every call
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Token lifecycle settings
#[derive(serde::Deserialize, Clone, Debug)]
pub struct SessionSettings {
    pub expiry_skew_seconds: i64,     // refresh this many seconds before `exp`
    pub check_interval_seconds: u64,  // background check period
    pub storage_path: Option<PathBuf>, // None keeps tokens in memory only
}

impl SessionSettings {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }
}

/// Navigation targets used by logout and the guards
#[derive(serde::Deserialize, Clone, Debug)]
pub struct RouteSettings {
    pub home: String,
    pub login: String,
    pub admin: String,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct GuardSettings {
    pub required_role: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings {
                base_url: "http://127.0.0.1:8000".to_string(),
                timeout_seconds: 10,
            },
            session: SessionSettings {
                expiry_skew_seconds: 30,
                check_interval_seconds: 5 * 60,
                storage_path: None,
            },
            routes: RouteSettings {
                home: "/".to_string(),
                login: "/login".to_string(),
                admin: "/admin".to_string(),
            },
            guard: GuardSettings {
                required_role: "admin".to_string(),
            },
        }
    }
}

impl Settings {
    /// Reject values the session layer cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue("api.base_url is empty".to_string()));
        }
        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "api.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.session.check_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "session.check_interval_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load settings from defaults, an optional `configuration` file and
/// `APP_`-prefixed environment variables (`APP_API__BASE_URL=...`).
pub fn get_configuration() -> Result<Settings, AppError> {
    let defaults = Settings::default();
    let settings = config::Config::builder()
        .set_default("api.base_url", defaults.api.base_url)?
        .set_default("api.timeout_seconds", defaults.api.timeout_seconds)?
        .set_default("session.expiry_skew_seconds", defaults.session.expiry_skew_seconds)?
        .set_default("session.check_interval_seconds", defaults.session.check_interval_seconds)?
        .set_default("routes.home", defaults.routes.home)?
        .set_default("routes.login", defaults.routes.login)?
        .set_default("routes.admin", defaults.routes.admin)?
        .set_default("guard.required_role", defaults.guard.required_role)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}
