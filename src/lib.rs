pub mod ai;
pub mod app;
pub mod auth;
pub mod config;
pub mod constants;
pub mod db;
pub mod envelope;
pub mod errors;
pub mod graph;
pub mod handlers;
pub mod insights;
pub mod models;
pub mod recommendations;
pub mod seed;
pub mod state;
pub mod stats;
pub mod storage;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::{load_data, persist_data};
