//! Speech synthesis — pluggable trait + factory.

pub mod espeak;
pub mod sapi;

use crate::config::SynthConfig;

/// Trait for text-to-speech backends.
pub trait Synthesizer: Send + Sync {
    /// Speak `text` out loud, blocking until playback completes.
    fn speak(&self, text: &str) -> anyhow::Result<()>;
    /// Human-readable name for logs and UI.
    fn name(&self) -> &str;
    /// Check if the backend is usable on this machine.
    #[allow(dead_code)]
    fn is_available(&self) -> bool;
}

// ── Pending placeholder ────────────────────────────────────────────────────

/// Placeholder returned when a backend can't be initialised. The app stays
/// alive; speak attempts return a clear error.
pub struct PendingSynthesizer {
    backend: String,
    reason: String,
}

impl PendingSynthesizer {
    pub fn new(backend: String, reason: String) -> Self {
        Self { backend, reason }
    }
}

impl Synthesizer for PendingSynthesizer {
    fn speak(&self, _text: &str) -> anyhow::Result<()> {
        anyhow::bail!("{} — {}", self.backend, self.reason)
    }
    fn name(&self) -> &str {
        "pending"
    }
    fn is_available(&self) -> bool {
        false
    }
}

/// Create a synthesis backend based on config.
///
/// Never fails fatally — an unknown backend degrades to a
/// `PendingSynthesizer` placeholder and the failure surfaces on first use.
pub fn create_synthesizer(cfg: &SynthConfig) -> anyhow::Result<Box<dyn Synthesizer>> {
    let result: anyhow::Result<Box<dyn Synthesizer>> = match cfg.backend.as_str() {
        "espeak" => Ok(Box::new(espeak::EspeakSynthesizer::new(cfg))),
        "sapi" => Ok(Box::new(sapi::SapiSynthesizer::new(cfg))),
        other => Err(anyhow::anyhow!("Unknown synthesis backend: {other}")),
    };

    match result {
        Ok(s) => Ok(s),
        Err(e) => {
            let reason = format!("{e:#}");
            log::warn!(
                "Synthesis backend '{}' unavailable: {reason} — using pending placeholder",
                cfg.backend
            );
            Ok(Box::new(PendingSynthesizer::new(cfg.backend.clone(), reason)))
        }
    }
}
