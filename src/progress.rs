//! Progress-callback trait for per-stage extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to follow a
//! request through the four pipeline stages. All methods have no-op defaults.
//!
//! # Example
//!
//! ```rust
//! use cv2json::{ExtractionConfig, ExtractionProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Log;
//!
//! impl ExtractionProgressCallback for Log {
//!     fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
//!         eprintln!("{} done in {elapsed_ms}ms", stage.label());
//!     }
//! }
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(Arc::new(Log))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    ExtractText,
    BuildPrompt,
    InvokeModel,
    Validate,
}

impl Stage {
    /// Short human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::ExtractText => "Extracting text",
            Stage::BuildPrompt => "Building prompt",
            Stage::InvokeModel => "Calling model",
            Stage::Validate => "Validating response",
        }
    }
}

/// Called by the pipeline as a request moves through its stages.
///
/// Requests may run concurrently, so implementations must be `Send + Sync`
/// and protect any shared mutable state.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called before a stage starts.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called after a stage succeeds.
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called when a stage fails. No further events follow for this request.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }
}

/// Shared handle stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

/// A callback that ignores every event.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ExtractionProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start {stage:?}"));
        }

        fn on_stage_error(&self, stage: Stage, error: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("error {stage:?}: {error}"));
        }
    }

    #[test]
    fn defaults_are_noops() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::ExtractText);
        cb.on_stage_complete(Stage::ExtractText, 5);
        cb.on_stage_error(Stage::Validate, "boom");
    }

    #[test]
    fn overridden_methods_fire() {
        let rec = Recorder::default();
        rec.on_stage_start(Stage::InvokeModel);
        rec.on_stage_complete(Stage::InvokeModel, 10);
        rec.on_stage_error(Stage::Validate, "missing name");
        let events = rec.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "start InvokeModel".to_string(),
                "error Validate: missing name".to_string()
            ]
        );
    }

    #[test]
    fn labels() {
        assert_eq!(Stage::InvokeModel.label(), "Calling model");
    }
}
