pub mod gateway;
pub mod reconcile;
pub mod status_poll;
