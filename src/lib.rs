pub mod app;
pub mod cache;
pub mod combine;
pub mod config;
pub mod connectors;
pub mod dedup;
pub mod domain;
pub mod error;
pub mod export;
pub mod fetch;
pub mod fs_util;
pub mod output;
pub mod providers;
