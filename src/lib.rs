pub mod config;
pub mod error;
pub mod notify;
pub mod record;
pub mod rules;
pub mod stream;
