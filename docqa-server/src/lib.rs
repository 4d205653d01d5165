//! # docqa-server
//!
//! HTTP front end for [`docqa_rag`]:
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /api/process_document` | Ingest the raw request body as a document |
//! | `POST /api/get_answer` | Answer `{"query", "system_prompt"?}` from ingested documents |
//! | `GET /health` | Liveness probe, never authenticated |
//!
//! Configuration comes from the environment (see [`config`]); the binary also
//! loads a `.env` file when present.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;

pub use config::{AppConfig, ConfigError, LogFormat, ServerConfig};
pub use error::ApiError;
pub use routes::app_router;
pub use server::run_server;
pub use state::AppState;
