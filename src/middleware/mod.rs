pub mod auth;
pub mod cors;
pub mod in_flight;
