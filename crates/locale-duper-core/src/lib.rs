pub mod abort;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod field_copy;
pub mod locales;
pub mod model;
pub mod progress;
pub mod stats;
pub mod strip;

pub use abort::AbortSignal;
pub use client::{ContentApi, DatoClient};
pub use config::AppConfig;
pub use engine::{DuplicationEngine, DuplicationRequest, EngineOptions, RunOutcome};
pub use error::{Error, Result};
pub use progress::{ProgressLog, ProgressReporter, ProgressUpdate, SilentReporter, UpdateKind};
pub use stats::DuplicationStats;
