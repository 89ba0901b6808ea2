/// Authentication module
///
/// Client-side session continuity: token storage, access token expiry,
/// single-flight refresh, login/logout and background checks.

mod auto_refresh;
mod backend;
pub mod claims;
mod login;
pub(crate) mod session;
mod token_store;
mod user;

pub use auto_refresh::{BackgroundChecks, DEFAULT_CHECK_INTERVAL, MIN_CHECK_INTERVAL};
pub use backend::{AuthBackend, HttpAuthBackend, LoginRequest, LoginResponse, LoginUser};
pub use claims::Claims;
pub use login::{LoginForm, LoginOutcome, ADMIN_ROLE, DEFAULT_LOGIN_ERROR};
pub use session::SessionManager;
pub use token_store::{
    FileStorage, KeyValueStorage, MemoryStorage, TokenPair, TokenStore, ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
};
pub use user::{CurrentUser, UserId};
