//! espeak-ng backend — speaks through the espeak-ng command-line engine.

use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use super::Synthesizer;
use crate::config::SynthConfig;

/// Speaks by spawning `espeak-ng` and waiting for playback to finish.
pub struct EspeakSynthesizer {
    voice: Option<String>,
    rate_wpm: Option<u32>,
    timeout: Option<Duration>,
}

impl EspeakSynthesizer {
    pub fn new(cfg: &SynthConfig) -> Self {
        Self {
            voice: cfg.voice.clone(),
            rate_wpm: cfg.rate_wpm,
            timeout: cfg.timeout_secs.map(Duration::from_secs),
        }
    }

    fn build_command(&self, text: &str) -> Command {
        let mut cmd = Command::new("espeak-ng");
        if let Some(voice) = &self.voice {
            cmd.arg("-v").arg(voice);
        }
        if let Some(rate) = self.rate_wpm {
            cmd.arg("-s").arg(rate.to_string());
        }
        // `--` so text starting with a dash isn't read as a flag
        cmd.arg("--").arg(text);
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
        cmd
    }
}

impl Synthesizer for EspeakSynthesizer {
    fn speak(&self, text: &str) -> Result<()> {
        let mut child = self
            .build_command(text)
            .spawn()
            .context("Failed to launch espeak-ng — is it installed?")?;

        let status = match self.timeout {
            Some(limit) => wait_with_deadline(&mut child, limit)?,
            None => child.wait().context("espeak-ng did not finish")?,
        };

        if !status.success() {
            anyhow::bail!("espeak-ng exited with {status}");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "espeak-ng"
    }

    fn is_available(&self) -> bool {
        Command::new("espeak-ng")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

/// Poll the child until it exits or the deadline passes; kill on overrun.
fn wait_with_deadline(child: &mut Child, limit: Duration) -> Result<ExitStatus> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait().context("espeak-ng wait failed")? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            anyhow::bail!("playback cut off after {}s", limit.as_secs());
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn default_command_is_just_the_text() {
        let synth = EspeakSynthesizer::new(&SynthConfig::default());
        let cmd = synth.build_command("hello world");
        assert_eq!(cmd.get_program(), "espeak-ng");
        assert_eq!(args_of(&cmd), vec!["--", "hello world"]);
    }

    #[test]
    fn voice_and_rate_become_flags() {
        let cfg = SynthConfig {
            voice: Some("hi".into()),
            rate_wpm: Some(150),
            ..Default::default()
        };
        let synth = EspeakSynthesizer::new(&cfg);
        let args = args_of(&synth.build_command("text"));
        assert_eq!(args, vec!["-v", "hi", "-s", "150", "--", "text"]);
    }

    #[test]
    fn leading_dash_text_is_not_a_flag() {
        let synth = EspeakSynthesizer::new(&SynthConfig::default());
        let args = args_of(&synth.build_command("-rf /"));
        assert_eq!(args.last().unwrap(), "-rf /");
        assert!(args.contains(&"--".to_string()));
    }
}
