use std::net::SocketAddr;
use std::sync::Arc;

use sattva_api::{
    app,
    state::{AppState, AuthConfig},
};
use sattva_booking::{BookingService, InstructorRoster};
use sattva_notify::{Mailer, SmtpConfig};
use sattva_payment::{build_gateway, EsewaConfig};
use sattva_store::StoreBookingRepository;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sattva_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = sattva_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Sattva API on port {}", config.server.port);

    let db = sattva_store::DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let repo = Arc::new(StoreBookingRepository::new(db.pool.clone()));
    let roster = InstructorRoster::new(config.instructors.clone());
    let booking_service = Arc::new(BookingService::new(repo, roster));

    let gateway_version = config
        .gateway
        .version
        .parse()
        .expect("Invalid gateway version in config");
    let gateway = build_gateway(EsewaConfig {
        version: gateway_version,
        merchant_code: config.gateway.merchant_code.clone(),
        secret: config.gateway.secret.clone(),
        gateway_base_url: config.gateway.base_url.clone(),
        success_url: config.gateway.success_url.clone(),
        failure_url: config.gateway.failure_url.clone(),
    });

    let mailer = Arc::new(Mailer::new(config.smtp.as_ref().map(|s| SmtpConfig {
        host: s.host.clone(),
        port: s.port,
        from_address: s.from_address.clone(),
        username: s.username.clone(),
        password: s.password.clone(),
    })));

    let app_state = AppState {
        bookings: booking_service,
        gateway,
        mailer,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
