use std::sync::Arc;
use medicare_session::configuration::get_configuration;
use medicare_session::guard::GuardView;
use medicare_session::navigation::NavigationHistory;
use medicare_session::startup::AppContext;
use medicare_session::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry("info");

    tracing::info!("Starting session client");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!(base_url = %config.api.base_url, "Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let navigator = Arc::new(NavigationHistory::new());
    let context = AppContext::build(configuration, navigator.clone()).map_err(|e| {
        tracing::error!("Failed to build session context: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, "Startup error")
    })?;

    let _checks = context.start_background_checks();

    match context.admin_guard().evaluate().await {
        GuardView::Granted => tracing::info!("Admin area accessible"),
        GuardView::Redirect(path) => tracing::info!(path = %path, "Not signed in, redirected"),
        GuardView::Denied(denied) => {
            tracing::warn!(reason = %denied.reason.message(), "Admin area denied")
        }
        GuardView::Loading => {}
    }

    tracing::info!("Session client running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    tracing::info!(last_path = ?navigator.current(), "Shutting down");
    Ok(())
}
