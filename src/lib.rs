pub mod api_client;
pub mod auth;
pub mod configuration;
pub mod envelope;
pub mod error;
pub mod guard;
pub mod navigation;
pub mod resources;
pub mod startup;
pub mod telemetry;
pub mod validators;
