pub mod amount;
pub mod error;
pub mod id;
pub mod provider;
pub mod record;
pub mod status;
pub mod store;
