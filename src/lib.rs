pub mod config;
pub mod engine;
pub mod errors;
pub mod init;
pub mod ledger;
pub mod review;
pub mod storage;
pub mod ui;
