//! # Observability
//!
//! Structured logging for the capture and analysis pipeline via `tracing`.
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │ capture / integrity / analysis / report   │
//! │   tracing::info!(), warn!(), error!()     │
//! └─────────────────────┬─────────────────────┘
//!                       ▼
//!               ┌───────────────┐
//!               │  fmt layer    │──► stderr
//!               │  + EnvFilter  │
//!               └───────────────┘
//! ```

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
