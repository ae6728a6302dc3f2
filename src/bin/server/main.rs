use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{App, HttpServer};
use anyhow::Context;
use env_logger::Env;
use hallways::db::init_db;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();
    init_our_mods();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    init_db(database_url).await;

    {
        let auth = hallways::app_config::auth();
        if auth.jwt_secret.is_empty() {
            log::warn!("HALLWAYS_AUTH__JWT_SECRET is not set; all requests will be treated as guests.");
        }
        if auth.webhook_secret.is_empty() {
            log::warn!("HALLWAYS_AUTH__WEBHOOK_SECRET is not set; the identity webhook is disabled.");
        }
    }

    let bind_addr =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    log::info!("Hallways starting on http://{}", bind_addr);

    HttpServer::new(move || {
        App::new()
            // Security headers - applied to all responses
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
            )
            .wrap(Logger::new("%a %{User-Agent}i"))
            .configure(hallways::web::configure)
    })
    .bind(&bind_addr)
    .with_context(|| format!("failed to bind {}", bind_addr))?
    .run()
    .await?;

    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

/// Initialize all local mods.
fn init_our_mods() {
    hallways::app_config::init();
}
