use std::{fmt, sync::Arc};

use cohort_core::IdentityService;

#[derive(Clone)]
pub struct AppState {
    identity: IdentityService,
    app_name: Arc<str>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("app_name", &self.app_name)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(identity: IdentityService, app_name: impl Into<Arc<str>>) -> Self {
        Self {
            identity,
            app_name: app_name.into(),
        }
    }

    pub fn identity(&self) -> &IdentityService {
        &self.identity
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }
}
