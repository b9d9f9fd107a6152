//! Windows SAPI backend — System.Speech via PowerShell, blocking Speak call.

use std::process::{Command, Stdio};

use anyhow::{Context, Result};

use super::Synthesizer;
use crate::config::SynthConfig;

/// Speaks through the Windows speech synthesizer. Works anywhere PowerShell
/// and System.Speech are present, i.e. Windows.
pub struct SapiSynthesizer {
    rate_wpm: Option<u32>,
}

impl SapiSynthesizer {
    pub fn new(cfg: &SynthConfig) -> Self {
        Self { rate_wpm: cfg.rate_wpm }
    }

    fn build_script(&self, text: &str) -> String {
        // Single-quoted PowerShell string: only ' needs escaping.
        let escaped = text.replace('\'', "''");
        let rate = match self.rate_wpm {
            // SAPI rate runs -10..10 around a ~180 wpm default
            Some(wpm) => format!(
                "$synth.Rate = {}; ",
                ((wpm as i64 - 180) / 20).clamp(-10, 10)
            ),
            None => String::new(),
        };
        format!(
            "Add-Type -AssemblyName System.Speech; \
             $synth = New-Object System.Speech.Synthesis.SpeechSynthesizer; \
             {rate}$synth.Speak('{escaped}');"
        )
    }
}

impl Synthesizer for SapiSynthesizer {
    fn speak(&self, text: &str) -> Result<()> {
        let status = Command::new("powershell")
            .args(["-NoProfile", "-Command", &self.build_script(text)])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .context("Failed to launch PowerShell for SAPI speech")?;

        if !status.success() {
            anyhow::bail!("SAPI speech exited with {status}");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "sapi"
    }

    fn is_available(&self) -> bool {
        cfg!(target_os = "windows")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_quotes_the_text() {
        let synth = SapiSynthesizer::new(&SynthConfig::default());
        let script = synth.build_script("hello world");
        assert!(script.contains("$synth.Speak('hello world');"));
        assert!(script.contains("System.Speech"));
    }

    #[test]
    fn single_quotes_are_doubled() {
        let synth = SapiSynthesizer::new(&SynthConfig::default());
        let script = synth.build_script("it's fine");
        assert!(script.contains("Speak('it''s fine')"));
    }

    #[test]
    fn rate_maps_into_sapi_range() {
        let cfg = SynthConfig {
            rate_wpm: Some(240),
            ..Default::default()
        };
        let synth = SapiSynthesizer::new(&cfg);
        assert!(synth.build_script("x").contains("$synth.Rate = 3;"));

        let slow = SapiSynthesizer::new(&SynthConfig {
            rate_wpm: Some(0),
            ..Default::default()
        });
        assert!(slow.build_script("x").contains("$synth.Rate = -9;"));
    }
}
