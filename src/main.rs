mod web;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use actix_files::Files;
use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{App, HttpServer};

use sapphire_trails::api::{ApiClient, Backend};
use sapphire_trails::config::AppConfig;
use sapphire_trails::db::Database;
use sapphire_trails::services::{AdminAuth, GeneratedTaglines, StaticTaglines, TaglineSource};

use web::handlers;
use web::middleware::{SecurityHeaders, SessionCookie};
use web::security::RateLimiter;
use web::session::SessionRegistry;

const PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

fn startup_error(what: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::other(format!("{what}: {err}"))
}

fn tagline_source(config: &AppConfig) -> Arc<dyn TaglineSource> {
    let Some(api_key) = config.tagline_api_key.clone() else {
        log::info!("TAGLINE_API_KEY not set; using fixed taglines");
        return Arc::new(StaticTaglines);
    };
    match GeneratedTaglines::new(
        api_key,
        config.tagline_model.clone(),
        config.tagline_ttl,
        config.request_timeout,
    ) {
        Ok(generated) => Arc::new(generated),
        Err(e) => {
            log::warn!("Tagline client unavailable ({e}); using fixed taglines");
            Arc::new(StaticTaglines)
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().map_err(|e| startup_error("configuration", e))?;
    let db = Database::new(&config.database_url)
        .await
        .map_err(|e| startup_error("database", e))?;
    AdminAuth::new(&db)
        .ensure_seeded()
        .await
        .map_err(|e| startup_error("admin seed", e))?;

    let api: Arc<dyn Backend> = Arc::new(
        ApiClient::new(&config.api_base_url, config.request_timeout)
            .map_err(|e| startup_error("api client", e))?,
    );
    log::info!("REST backend at {}", config.api_base_url);

    let sessions = Arc::new(SessionRegistry::new());
    let state = Data::new(web::AppState {
        db: db.clone(),
        api,
        sessions: sessions.clone(),
        rate_limiter: Arc::new(RateLimiter::new()),
        taglines: tagline_source(&config),
        config: Arc::new(config.clone()),
    });

    let session_idle = config.session_idle;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            match db.purge_stale_sessions(session_idle).await {
                Ok(0) => {}
                Ok(n) => log::info!("Purged {n} stale session entries"),
                Err(e) => log::warn!("Session purge failed: {e}"),
            }
            let dropped = sessions.purge_idle(session_idle.to_std().unwrap_or(Duration::from_secs(86_400)));
            if dropped > 0 {
                log::debug!("Dropped {dropped} idle in-memory sessions");
            }
        }
    });

    let secure = config.cookie_secure;
    log::info!("Listening on {}", config.bind_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(SessionCookie { secure })
            .wrap(SecurityHeaders { hsts: secure })
            .wrap(Logger::default())
            .configure(handlers::configure)
            .service(Files::new("/static", "./static").prefer_utf8(true))
            .default_service(actix_web::web::to(handlers::public::fallback))
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
