//! Application state shared by handlers and middleware.

use std::sync::Arc;

use mediary_core::Config;
use mediary_services::{IdentityService, LoginService, SessionService, UploadService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: SessionService,
    pub identity: IdentityService,
    pub login: LoginService,
    pub uploads: UploadService,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        sessions: SessionService,
        identity: IdentityService,
        uploads: UploadService,
    ) -> Self {
        let login = LoginService::new(identity.clone(), sessions.clone());
        Self {
            config,
            sessions,
            identity,
            login,
            uploads,
        }
    }
}
