//! vpn-panel-billing - webhook reconciliation server.
//!
//! Loads configuration, connects PostgreSQL, wires the reconciliation graph
//! and serves the provider webhooks. The activation sweeper runs beside the
//! server and stops with it.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

use vpn_panel_billing::adapters::control_plane::{ControlPlaneConfig, HttpControlPlane};
use vpn_panel_billing::adapters::http::{webhook_router, WebhooksAppState};
use vpn_panel_billing::adapters::jobs::{ActivationSweeper, ActivationSweeperConfig};
use vpn_panel_billing::adapters::notification::{HttpNotifier, LogNotifier, NotifierConfig};
use vpn_panel_billing::adapters::postgres::{
    PostgresPaymentRepository, PostgresReferralRepository, PostgresTariffCatalog,
    PostgresWebhookDeliveryRepository,
};
use vpn_panel_billing::application::handlers::payment::{
    ActivateTariffService, ActivationClaimLock, FulfillmentDispatcher, GrantExtraOptionService,
    NotificationSink, ProvisionProxySlotsService, ReferralCascade,
};
use vpn_panel_billing::application::{
    FulfillPaymentHandler, ReconcileWebhookHandler, SweepUnfulfilledHandler,
};
use vpn_panel_billing::config::{AppConfig, NotificationConfig, ServerConfig};
use vpn_panel_billing::domain::webhook::{PlategaCredentialVerifier, YooMoneySignatureVerifier};
use vpn_panel_billing::ports::{Notifier, WebhookDeliveryRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    tracing::info!(
        max_connections = config.database.max_connections,
        "Connecting to PostgreSQL"
    );
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let payments = Arc::new(PostgresPaymentRepository::new(pool.clone()));
    let catalog = Arc::new(PostgresTariffCatalog::new(pool.clone()));
    let journal: Arc<dyn WebhookDeliveryRepository> =
        Arc::new(PostgresWebhookDeliveryRepository::new(pool.clone()));

    let fulfillment_config = &config.fulfillment;
    let control_plane = Arc::new(HttpControlPlane::new(
        ControlPlaneConfig::new(&config.control_plane.base_url, config.control_plane.api_token())
            .with_timeout(fulfillment_config.control_plane_timeout()),
    )?);
    let notifications = NotificationSink::new(
        build_notifier(&config.notification, fulfillment_config.notification_timeout())?,
        fulfillment_config.notification_timeout(),
    );

    let referrals = Arc::new(
        ReferralCascade::new(
            Arc::new(PostgresReferralRepository::new(pool.clone())),
            config.referral.levels()?,
        )
        .with_notifications(notifications.clone()),
    );

    let timeout = fulfillment_config.control_plane_timeout();
    let fulfillment = Arc::new(FulfillPaymentHandler::new(
        ActivationClaimLock::new(payments.clone(), fulfillment_config.claim_stale_after()),
        FulfillmentDispatcher::new(
            ActivateTariffService::new(catalog.clone(), control_plane.clone(), timeout),
            ProvisionProxySlotsService::new(catalog, control_plane.clone(), timeout),
            GrantExtraOptionService::new(control_plane, timeout),
        ),
        referrals.clone(),
        notifications.clone(),
    ));

    let reconciler = ReconcileWebhookHandler::new(
        payments.clone(),
        fulfillment.clone(),
        referrals,
        notifications,
    )
    .with_journal(journal.clone());

    let state = WebhooksAppState {
        reconciler: Arc::new(reconciler),
        platega: config
            .payment
            .platega_credentials()
            .map(|(merchant, secret)| Arc::new(PlategaCredentialVerifier::new(merchant, secret))),
        yoomoney: config
            .payment
            .yoomoney_secret()
            .map(|secret| Arc::new(YooMoneySignatureVerifier::new(secret))),
        journal: Some(journal.clone()),
    };
    if state.platega.is_none() {
        tracing::warn!("Platega credentials not configured; endpoint disabled");
    }
    if state.yoomoney.is_none() {
        tracing::warn!("YooMoney notification secret not configured; endpoint disabled");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper_task = if fulfillment_config.sweep_enabled {
        let sweep = Arc::new(SweepUnfulfilledHandler::new(
            payments,
            fulfillment,
            fulfillment_config.claim_stale_after(),
            fulfillment_config.sweep_batch_size,
        ));
        let sweeper = ActivationSweeper::with_config(
            sweep,
            ActivationSweeperConfig::default()
                .with_interval(fulfillment_config.sweep_interval())
                .with_journal_retention(fulfillment_config.journal_retention()),
        )
        .with_journal(journal);
        Some(tokio::spawn(async move { sweeper.run(shutdown_rx).await }))
    } else {
        None
    };

    let app = webhook_router()
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(config.server.request_timeout())),
        )
        .with_state(state);

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "Webhook server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tx.send(true).ok();
    if let Some(task) = sweeper_task {
        task.await.ok();
    }
    tracing::info!("Shutdown complete");

    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    if server.json_logs() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_notifier(
    config: &NotificationConfig,
    timeout: Duration,
) -> Result<Arc<dyn Notifier>, Box<dyn std::error::Error>> {
    let Some(url) = config.gateway_url() else {
        tracing::warn!("Notification gateway not configured; notifications are only logged");
        return Ok(Arc::new(LogNotifier::new()));
    };

    let mut notifier_config = NotifierConfig::new(url).with_timeout(timeout);
    if let Some(token) = config.api_token() {
        notifier_config = notifier_config.with_api_token(token);
    }
    Ok(Arc::new(HttpNotifier::new(notifier_config)?))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
