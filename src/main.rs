use std::{net::SocketAddr, sync::Arc};

use tokio::signal;
use tracing::info;

use cantina_api as api;
use cantina_api::services::payments::PaymentGateway;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    let catalog = Arc::new(api::catalog::Catalog::load(&cfg.catalog_path)?);

    let (event_sender, event_rx) = api::events::channel(1024);
    tokio::spawn(api::events::process_events(event_rx));

    if cfg.stripe_secret_key.is_none() {
        info!("Payment provider API key not configured; checkout will be rejected");
    }
    let gateway: Arc<dyn PaymentGateway> = Arc::new(api::services::payments::StripeGateway::new(
        cfg.stripe_secret_key.clone(),
        cfg.currency.clone(),
    ));

    let notifier = cfg
        .cart_notifications
        .then(|| Arc::new(api::notifications::LogNotifier) as Arc<dyn api::notifications::Notifier>);

    let services = api::services::AppServices::new(event_sender.clone(), gateway, notifier);

    let state = Arc::new(api::AppState {
        config: cfg.clone(),
        catalog,
        event_sender,
        services,
    });

    let app = api::app(state);

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port).parse()?;
    info!("cantina-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
