pub mod adapters;
pub mod domain;
pub mod infra;
pub mod services;

use std::sync::Arc;

use crate::{
    adapters::rate_limit::PollLimiter,
    domain::{provider::PaymentProvider, store::RecordStore},
};

/// Deployment environment, from `APP_ENV`. Anything other than
/// `production` is treated as development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    #[default]
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV").as_deref() {
            Ok("production") => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub provider: Arc<dyn PaymentProvider>,
    pub poll_limiter: PollLimiter,
    pub server_key: Arc<str>,
    pub app_env: AppEnv,
}
