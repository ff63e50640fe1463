pub mod config;
pub mod domain;
pub mod http;
pub mod logging;
pub mod service;
pub mod store;
pub mod version;
