//! Speech recognition — pluggable trait + factory.

pub mod google_http;

use std::path::Path;

use thiserror::Error;

use crate::config::SttConfig;

/// Recognition failure taxonomy. `Unintelligible` is the no-match case;
/// transport and engine failures land in `Other`.
#[derive(Debug, Error)]
pub enum RecognizeError {
    #[error("could not understand audio")]
    Unintelligible,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Trait for speech-to-text backends.
pub trait Recognizer: Send + Sync {
    /// Transcribe a WAV file, hinted with a BCP-47 language code.
    fn recognize(&self, wav_path: &Path, language: &str) -> Result<String, RecognizeError>;
    /// Human-readable name for logs and UI.
    fn name(&self) -> &str;
    /// Check if the backend is reachable / functional.
    #[allow(dead_code)]
    fn is_available(&self) -> bool;
}

// ── Pending placeholder ────────────────────────────────────────────────────

/// Placeholder recognizer returned when a backend can't be initialised.
/// The app stays alive; recognition attempts return a clear error.
pub struct PendingRecognizer {
    backend: String,
    reason: String,
}

impl PendingRecognizer {
    pub fn new(backend: String, reason: String) -> Self {
        Self { backend, reason }
    }
}

impl Recognizer for PendingRecognizer {
    fn recognize(&self, _wav_path: &Path, _language: &str) -> Result<String, RecognizeError> {
        Err(RecognizeError::Other(anyhow::anyhow!(
            "{} — {}",
            self.backend,
            self.reason
        )))
    }
    fn name(&self) -> &str {
        "pending"
    }
    fn is_available(&self) -> bool {
        false
    }
}

/// Create a recognition backend based on config.
///
/// Never fails fatally — an unknown backend degrades to a
/// `PendingRecognizer` placeholder and the failure surfaces on first use.
pub fn create_recognizer(cfg: &SttConfig) -> anyhow::Result<Box<dyn Recognizer>> {
    let result: anyhow::Result<Box<dyn Recognizer>> = match cfg.backend.as_str() {
        "google-http" => Ok(Box::new(google_http::GoogleHttpRecognizer::new(cfg))),
        other => Err(anyhow::anyhow!("Unknown recognition backend: {other}")),
    };

    match result {
        Ok(r) => Ok(r),
        Err(e) => {
            let reason = format!("{e:#}");
            log::warn!(
                "Recognition backend '{}' unavailable: {reason} — using pending placeholder",
                cfg.backend
            );
            Ok(Box::new(PendingRecognizer::new(cfg.backend.clone(), reason)))
        }
    }
}
