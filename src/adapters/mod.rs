pub mod api;
pub mod api_errors;
pub mod provider_client;
pub mod rate_limit;
