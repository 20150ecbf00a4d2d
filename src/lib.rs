pub mod api;
pub mod config;
pub mod dashboard;
pub mod format;
pub mod report;
pub mod server;
pub mod storage;
pub mod viewer;
