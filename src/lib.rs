pub mod api;
pub mod app;
pub mod approvals;
pub mod cli;
pub mod error;
pub mod storage;
pub mod threads;
pub mod ui;
pub mod utils;
pub mod views;
