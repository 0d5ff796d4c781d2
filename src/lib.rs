pub mod api;
pub mod billing;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod invoice_gen;
pub mod models;
pub mod observability;
pub mod services;
pub mod ui;
