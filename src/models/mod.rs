pub mod application;
pub mod interview;
pub mod message;
pub mod user;
pub mod vacancy;
