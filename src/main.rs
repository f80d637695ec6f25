use actix_request_identifier::{IdReuse, RequestIdentifier};
use actix_web::web::Data;
use anyhow::Context;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use crate::config::Settings;
use crate::database::connect::{create_db_connection_pool, run_migrations};
use crate::routes::AppState;

mod checkout;
mod commission;
mod config;
mod database;
mod error;
mod mailer;
mod payu;
mod proto;
mod referral;
mod responses;
mod routes;
mod schema;
mod settlement;
mod withdrawal;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // setup tracing and use bunyan formatter
    let formatting_layer = BunyanFormattingLayer::new("course-ledger".into(), std::io::stdout);
    let subscriber = Registry::default()
        .with(filter_fn(|metadata| *metadata.level() <= tracing::Level::INFO))
        .with(JsonStorageLayer)
        .with(formatting_layer);
    tracing::subscriber::set_global_default(subscriber).context("failed to install tracing subscriber")?;

    let settings = Settings::from_env()?;
    if settings.payu.merchant_salt.is_empty() {
        warn!("PAYU_MERCHANT_SALT is not set, payment callback hashes will not be verified");
    }

    let db = create_db_connection_pool(&settings.database_url)?;
    run_migrations(&db)?;

    let mailer = mailer::create_mailer(&settings)?;
    let bind_address = settings.bind_address.clone();
    let state = Data::new(AppState { db, settings, mailer });

    info!(%bind_address, "starting server");
    actix_web::HttpServer::new(move || {
        actix_web::App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestIdentifier::with_uuid().use_incoming_id(IdReuse::UseIncoming))
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("failed to bind {bind_address}"))?
    .run()
    .await
    .context("server error")
}
