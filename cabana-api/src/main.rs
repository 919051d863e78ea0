use std::net::SocketAddr;
use std::sync::Arc;

use cabana_api::{app, state::AuthConfig, worker, AppState};
use cabana_booking::{AvailabilityChecker, ExpirySweeper, PaymentHandoff, ReservationManager};
use cabana_store::{DbClient, PgCabinRepository, PgReservationRepository, RedisClient, StripeCheckout};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cabana_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = cabana_store::app_config::Config::load()?;
    tracing::info!("Starting Cabana API on port {}", config.server.port);

    // Postgres
    let db = DbClient::new(&config.database.url).await?;
    db.migrate().await?;

    let cabins: Arc<dyn cabana_core::CabinRepository> =
        Arc::new(PgCabinRepository::new(db.pool.clone()));
    let reservations: Arc<dyn cabana_core::ReservationRepository> =
        Arc::new(PgReservationRepository::new(db.pool.clone()));

    // Booking engine
    let checker = Arc::new(AvailabilityChecker::new(
        cabins.clone(),
        reservations.clone(),
    ));
    let manager = Arc::new(ReservationManager::new(
        cabins.clone(),
        reservations.clone(),
    ));

    // Payment processor
    let stripe = StripeCheckout::new(&config.stripe)
        .map_err(|e| anyhow::anyhow!("failed to build stripe client: {}", e))?;
    let payments = Arc::new(PaymentHandoff::new(
        Arc::new(stripe),
        reservations.clone(),
        config.stripe.currency.clone(),
    ));

    // Redis is optional; only rate limiting depends on it.
    let redis = match &config.redis {
        Some(redis_config) => {
            let client = RedisClient::new(&redis_config.url).await?;
            Some(Arc::new(client))
        }
        None => {
            tracing::warn!("No Redis configured, rate limiting disabled");
            None
        }
    };

    let app_state = AppState {
        cabins,
        reservations,
        checker,
        manager: manager.clone(),
        payments,
        redis,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    };

    // Background reclamation of abandoned pendiente reservations.
    let sweeper = ExpirySweeper::new(manager, config.business_rules.pending_ttl_minutes);
    tokio::spawn(worker::start_expiry_worker(
        sweeper,
        config.business_rules.sweep_interval_seconds,
    ));

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
