pub mod api;
pub mod app;
pub mod config;
pub mod logging;
pub mod openapi;
pub mod retention;
pub mod sampler;
pub mod state;
