use std::sync::Arc;

use crate::{db::DbPool, media::FsMediaStore, services::auth_service::LoginRateLimiter};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub media: FsMediaStore,
    pub logins: Arc<LoginRateLimiter>,
}

impl AppState {
    pub fn new(pool: DbPool, media: FsMediaStore) -> Self {
        Self {
            pool,
            media,
            logins: Arc::new(LoginRateLimiter::default()),
        }
    }
}
