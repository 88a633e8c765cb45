//! Prompt-to-image generation against Gemini image models, with concurrent
//! batches and a capped, persisted gallery.

pub mod app;
pub mod batch;
pub mod config;
pub mod credentials;
pub mod download;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod progress;
pub mod session;
pub mod storage;

pub use app::{GalleryView, LensApp, SubmitOutcome, CANCELLED_MESSAGE};
pub use batch::{BatchOrchestrator, BatchRequest};
pub use config::{Config, GeminiConfig};
pub use credentials::CredentialSelector;
pub use error::{LensError, Result};
pub use gemini::{ContentApi, GeminiClient, HttpContentApi, ImageClient};
pub use models::*;
pub use session::{transition, Effect, Phase, SessionEvent, SessionState};
pub use storage::{HistoryCache, JsonFileStore, KeyValueStore, MemoryStore};
