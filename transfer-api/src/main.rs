use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transfer_api::auth::JwtIdentityProvider;
use transfer_api::{app, state::{AppState, AuthConfig}};
use transfer_booking::{BookingOrchestrator, SubmissionConfig};
use transfer_catalog::{AvailabilityLedger, InMemoryLedger};
use transfer_core::{BookingEventPublisher, BookingStore, NoopPublisher};
use transfer_store::app_config::Config;
use transfer_store::{DbClient, InMemoryBookingStore, PgBookingStore, RedisClient, RedisLedger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "transfer_api=debug,transfer_booking=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    let catalog = config.catalog.clone().build().context("Invalid catalog")?;
    tracing::info!(
        origins = catalog.routes.list_origins().len(),
        vehicle_classes = catalog.routes.vehicles().len(),
        "Catalog loaded"
    );

    let store: Arc<dyn BookingStore> = match &config.database {
        Some(database) => {
            let db = DbClient::new(database).await.context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            Arc::new(PgBookingStore::new(db.pool.clone()))
        }
        None => {
            tracing::warn!("No database configured, bookings are kept in memory");
            Arc::new(InMemoryBookingStore::new())
        }
    };

    let ledger: Arc<dyn AvailabilityLedger> = match &config.redis {
        Some(redis) => {
            let client = RedisClient::new(&redis.url).context("Invalid Redis URL")?;
            client.ping().await.context("Failed to reach Redis")?;
            Arc::new(RedisLedger::new(client))
        }
        None => {
            tracing::warn!("No Redis configured, availability is tracked per process");
            Arc::new(InMemoryLedger::new())
        }
    };

    let events = event_publisher(&config)?;

    let orchestrator = BookingOrchestrator::new(
        catalog.clone(),
        ledger,
        store,
        events,
        SubmissionConfig {
            persistence_timeout: config.booking.persistence_timeout(),
            ledger_timeout: config.booking.ledger_timeout(),
        },
    );

    let app_state = AppState {
        catalog,
        orchestrator: Arc::new(orchestrator),
        identity: Arc::new(JwtIdentityProvider::new(config.auth.jwt_secret.clone())),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        default_locale: config.booking.default_locale,
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid listen address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(app_state)).await?;
    Ok(())
}

#[cfg(feature = "kafka")]
fn event_publisher(config: &Config) -> anyhow::Result<Arc<dyn BookingEventPublisher>> {
    match &config.kafka {
        Some(kafka) => {
            let publisher = transfer_store::KafkaEventPublisher::new(kafka).context("Failed to create Kafka producer")?;
            Ok(Arc::new(publisher))
        }
        None => Ok(Arc::new(NoopPublisher)),
    }
}

#[cfg(not(feature = "kafka"))]
fn event_publisher(config: &Config) -> anyhow::Result<Arc<dyn BookingEventPublisher>> {
    if config.kafka.is_some() {
        tracing::warn!("Kafka configured but this build lacks the `kafka` feature, events are only logged");
    }
    Ok(Arc::new(NoopPublisher))
}
