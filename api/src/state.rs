use std::sync::Arc;

use govdesk_engine::DecisionEngine;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    /// Service catalog database, also probed by `/health`
    pub db: PgPool,
    pub engine: Arc<DecisionEngine>,
}
