pub mod accounts;
pub mod api;
pub mod bootstrap;
pub mod config;
pub mod database;
pub mod discussions;
pub mod enrichment;
pub mod node;
pub mod rag;
pub mod telemetry;
pub mod utils;
