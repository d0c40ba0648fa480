use std::sync::Arc;

use sapphire_trails::api::Backend;
use sapphire_trails::config::AppConfig;
use sapphire_trails::db::Database;
use sapphire_trails::services::TaglineSource;

use crate::web::security::RateLimiter;
use crate::web::session::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub api: Arc<dyn Backend>,
    pub sessions: Arc<SessionRegistry>,
    pub rate_limiter: Arc<RateLimiter>,
    pub taglines: Arc<dyn TaglineSource>,
    pub config: Arc<AppConfig>,
}
