// src/config/mod.rs
pub mod app;

pub use app::{AppConfig, FilterConfig, NotifyConfig, SourceConfig, StateConfig, WatchConfig};
