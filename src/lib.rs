pub mod api;
pub mod config;
pub mod engine;
pub mod relay;
pub mod session;
pub mod suggest;
