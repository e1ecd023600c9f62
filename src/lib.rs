//! Lectern generates classroom-ready lesson presentations with an LLM.
//!
//! Give it a topic, a grade level and a slide count; it plans the deck,
//! prompts the configured provider (OpenAI or Google Gemini), validates
//! the model's JSON against the presentation schema and hands back a
//! typed [`Presentation`](types::Presentation). Decks always follow the
//! same shape: a title slide, an agenda, the requested content slides and
//! a conclusion, with at most one quiz question on a content slide.
//!
//! # Quick Start
//!
//! ```no_run
//! use lectern::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads OPENAI_API_KEY / GOOGLE_API_KEY and friends.
//!     let settings = Settings::from_env();
//!     let engine = GenerationEngine::from_settings(&settings)?;
//!
//!     let request = LessonRequest::new("Photosynthesis", "7th grade", 5);
//!     let presentation = engine.generate(&request).await?;
//!     assert_eq!(presentation.slides.len(), 8);
//!     Ok(())
//! }
//! ```
//!
//! # Streaming
//!
//! Slides can also be consumed one at a time as they are generated. The
//! stream is finite, ordered and cancellable:
//!
//! ```no_run
//! use futures::StreamExt;
//! use lectern::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let engine = GenerationEngine::from_settings(&Settings::from_env())?;
//! let request = LessonRequest::new("The Water Cycle", "5th grade", 4);
//! let handle = CancelHandle::new();
//! let mut slides = engine.stream_with_cancel(&request, handle.clone());
//!
//! while let Some(slide) = slides.next().await {
//!     let slide = slide?;
//!     println!("{}: {}", slide.slide_type, slide.title);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The optional `server` feature adds an axum HTTP shell with JSON and
//! SSE endpoints, served by the bundled `lectern-server` binary.

#![deny(unsafe_code)]

pub mod assembler;
pub mod config;
pub mod engine;
pub mod error;
pub mod parser;
pub mod prompt;
pub mod provider;
pub mod retry;
#[cfg(feature = "server")]
pub mod server;
pub mod stream;
pub mod types;

pub use config::{ProviderKind, Settings};
pub use engine::GenerationEngine;
pub use error::{EngineError, Result};
pub use retry::RetryPolicy;
pub use stream::{CancelHandle, SlideStream};
pub use types::{LessonRequest, Presentation, Question, Slide, SlideType};

/// Convenient pre-import module.
pub mod prelude {
    pub use crate::config::{ProviderKind, Settings};
    pub use crate::engine::GenerationEngine;
    pub use crate::error::EngineError;
    pub use crate::provider::{ChatModel, CompletionRequest};
    pub use crate::retry::RetryPolicy;
    pub use crate::stream::{CancelHandle, SlideStream};
    pub use crate::types::{LessonRequest, Presentation, Question, Slide, SlideType};
}
