//! Background worker — runs one speak or transcribe action per activation.
//!
//! The UI thread owns all session state; the worker only sends events back
//! over an mpsc channel. Every failure terminates by emitting a status
//! string, so nothing propagates out of `run_action`.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use anyhow::Context;

use crate::audio::{AudioSource, CaptureError, Clip};
use crate::stt::{RecognizeError, Recognizer};
use crate::synth::Synthesizer;

// ── Status line text ───────────────────────────────────────────────────────

pub const STATUS_PROCESSING: &str = "Processing… please wait";
pub const STATUS_NO_TEXT: &str = "No text entered";
pub const STATUS_DONE_SPEAKING: &str = "Done speaking";
pub const STATUS_LISTENING: &str = "Listening…";
pub const STATUS_RECOGNIZING: &str = "Recognizing…";
pub const STATUS_COMPLETE: &str = "Speech to text complete";
pub const STATUS_TIMED_OUT: &str = "Listening timed out. Try again";
pub const STATUS_UNINTELLIGIBLE: &str = "Could not understand audio";

// ── Mode ───────────────────────────────────────────────────────────────────

/// Which action the button runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Speak,
    Transcribe,
}

impl Mode {
    /// Label shown on the action button.
    pub fn action_label(self) -> &'static str {
        match self {
            Mode::Speak => "Speak",
            Mode::Transcribe => "Listen",
        }
    }

    /// Status line shown when the mode is selected.
    pub fn description(self) -> &'static str {
        match self {
            Mode::Speak => "Mode: text to speech",
            Mode::Transcribe => "Mode: speech to text",
        }
    }
}

// ── Events ─────────────────────────────────────────────────────────────────

/// Events the worker sends back to the UI thread.
#[derive(Debug)]
pub enum WorkerEvent {
    /// Replace the status line.
    Status(String),
    /// Replace the entire text buffer.
    Transcript(String),
    /// The action finished; the activation slot is free again.
    Finished,
}

/// Engine set shared between activations.
pub struct Engines {
    pub synth: Box<dyn Synthesizer>,
    pub stt: Box<dyn Recognizer>,
    pub mic: Box<dyn AudioSource>,
}

// ── Actions ────────────────────────────────────────────────────────────────

/// Spawn the worker thread for one activation. Always ends with `Finished`.
pub fn spawn(
    mode: Mode,
    text: String,
    language: String,
    engines: Arc<Engines>,
    tx: Sender<WorkerEvent>,
) {
    std::thread::Builder::new()
        .name("vaani-worker".into())
        .spawn(move || {
            run_action(mode, &text, &language, &engines, &tx);
            let _ = tx.send(WorkerEvent::Finished);
        })
        .expect("spawn worker thread");
}

/// Run one action to completion, reporting progress and outcome as events.
pub fn run_action(
    mode: Mode,
    text: &str,
    language: &str,
    engines: &Engines,
    tx: &Sender<WorkerEvent>,
) {
    match mode {
        Mode::Speak => speak(text, engines, tx),
        Mode::Transcribe => transcribe(language, engines, tx),
    }
}

fn speak(text: &str, engines: &Engines, tx: &Sender<WorkerEvent>) {
    let text = text.trim();
    if text.is_empty() {
        send_status(tx, STATUS_NO_TEXT);
        return;
    }

    log::info!("Speaking {} chars via {}", text.len(), engines.synth.name());
    match engines.synth.speak(text) {
        Ok(()) => send_status(tx, STATUS_DONE_SPEAKING),
        Err(e) => send_status(tx, &format!("Error: {e:#}")),
    }
}

fn transcribe(language: &str, engines: &Engines, tx: &Sender<WorkerEvent>) {
    send_status(tx, STATUS_LISTENING);
    let clip = match engines.mic.capture() {
        Ok(clip) => clip,
        Err(CaptureError::Timeout) => {
            send_status(tx, STATUS_TIMED_OUT);
            return;
        }
        Err(CaptureError::Other(e)) => {
            send_status(tx, &format!("Error: {e:#}"));
            return;
        }
    };
    log::info!(
        "Captured {:.1}s of audio",
        clip.samples.len() as f64 / clip.sample_rate as f64
    );

    send_status(tx, STATUS_RECOGNIZING);
    let tmp = match write_temp_wav(&clip) {
        Ok(tmp) => tmp,
        Err(e) => {
            send_status(tx, &format!("Error: {e:#}"));
            return;
        }
    };

    match engines.stt.recognize(tmp.path(), language) {
        Ok(transcript) => {
            let _ = tx.send(WorkerEvent::Transcript(transcript));
            send_status(tx, STATUS_COMPLETE);
        }
        Err(RecognizeError::Unintelligible) => send_status(tx, STATUS_UNINTELLIGIBLE),
        Err(RecognizeError::Other(e)) => send_status(tx, &format!("Error: {e:#}")),
    }
}

fn send_status(tx: &Sender<WorkerEvent>, status: &str) {
    log::info!("Status: {status}");
    let _ = tx.send(WorkerEvent::Status(status.to_string()));
}

/// Write a captured clip to a temp WAV (16-bit mono) for the recognizer.
fn write_temp_wav(clip: &Clip) -> anyhow::Result<tempfile::NamedTempFile> {
    let tmp = tempfile::Builder::new()
        .prefix("vaani")
        .suffix(".wav")
        .tempfile()
        .context("create temp WAV")?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: clip.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(tmp.path(), spec).context("create WAV writer")?;
    for &sample in &clip.samples {
        let s16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        writer.write_sample(s16)?;
    }
    writer.finalize().context("finalize WAV")?;
    Ok(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::mpsc::channel;
    use std::sync::Mutex;

    struct StubSynth {
        spoken: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl Synthesizer for StubSynth {
        fn speak(&self, text: &str) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("no audio device");
            }
            self.spoken.lock().unwrap().push(text.into());
            Ok(())
        }
        fn name(&self) -> &str { "stub" }
        fn is_available(&self) -> bool { true }
    }

    struct StubRecognizer {
        reply: Result<String, fn() -> RecognizeError>,
        languages: Arc<Mutex<Vec<String>>>,
    }

    impl Recognizer for StubRecognizer {
        fn recognize(&self, _: &Path, language: &str) -> Result<String, RecognizeError> {
            self.languages.lock().unwrap().push(language.into());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(make) => Err(make()),
            }
        }
        fn name(&self) -> &str { "stub" }
        fn is_available(&self) -> bool { true }
    }

    enum StubMic {
        Phrase,
        TimedOut,
    }

    impl AudioSource for StubMic {
        fn capture(&self) -> Result<Clip, CaptureError> {
            match self {
                StubMic::Phrase => Ok(Clip { samples: vec![0.1; 1600], sample_rate: 16000 }),
                StubMic::TimedOut => Err(CaptureError::Timeout),
            }
        }
        fn name(&self) -> &str { "stub" }
    }

    /// Build an engine set around stubs, handing back the shared call logs.
    fn make_engines(
        synth_fails: bool,
        reply: Result<String, fn() -> RecognizeError>,
        mic: StubMic,
    ) -> (Engines, Arc<Mutex<Vec<String>>>, Arc<Mutex<Vec<String>>>) {
        let spoken = Arc::new(Mutex::new(vec![]));
        let languages = Arc::new(Mutex::new(vec![]));
        let engines = Engines {
            synth: Box::new(StubSynth { spoken: spoken.clone(), fail: synth_fails }),
            stt: Box::new(StubRecognizer { reply, languages: languages.clone() }),
            mic: Box::new(mic),
        };
        (engines, spoken, languages)
    }

    /// Drain all events after a synchronous `run_action`.
    fn drain(rx: std::sync::mpsc::Receiver<WorkerEvent>) -> (Vec<String>, Vec<String>) {
        let mut statuses = vec![];
        let mut transcripts = vec![];
        for event in rx.try_iter() {
            match event {
                WorkerEvent::Status(s) => statuses.push(s),
                WorkerEvent::Transcript(t) => transcripts.push(t),
                WorkerEvent::Finished => {}
            }
        }
        (statuses, transcripts)
    }

    #[test]
    fn speak_invokes_synth_once_with_trimmed_text() {
        let (eng, spoken, _) = make_engines(false, Ok("".into()), StubMic::Phrase);
        let (tx, rx) = channel();

        run_action(Mode::Speak, "  Hello world \n", "en-IN", &eng, &tx);

        let (statuses, _) = drain(rx);
        assert_eq!(statuses.last().unwrap(), STATUS_DONE_SPEAKING);
        assert_eq!(&*spoken.lock().unwrap(), &["Hello world"]);
    }

    #[test]
    fn speak_empty_text_never_calls_synth() {
        let (eng, spoken, _) = make_engines(false, Ok("".into()), StubMic::Phrase);
        let (tx, rx) = channel();

        run_action(Mode::Speak, "   \n\t ", "en-IN", &eng, &tx);

        let (statuses, _) = drain(rx);
        assert_eq!(statuses, vec![STATUS_NO_TEXT.to_string()]);
        assert!(spoken.lock().unwrap().is_empty());
    }

    #[test]
    fn speak_engine_failure_becomes_error_status() {
        let (eng, _, _) = make_engines(true, Ok("".into()), StubMic::Phrase);
        let (tx, rx) = channel();

        run_action(Mode::Speak, "hello", "en-IN", &eng, &tx);

        let (statuses, _) = drain(rx);
        let last = statuses.last().unwrap();
        assert!(last.starts_with("Error:"), "got {last}");
        assert!(last.contains("no audio device"));
    }

    #[test]
    fn transcribe_timeout_sets_timeout_status_and_keeps_buffer() {
        let (eng, _, _) = make_engines(false, Ok("test".into()), StubMic::TimedOut);
        let (tx, rx) = channel();

        run_action(Mode::Transcribe, "previous text", "en-IN", &eng, &tx);

        let (statuses, transcripts) = drain(rx);
        assert_eq!(
            statuses,
            vec![STATUS_LISTENING.to_string(), STATUS_TIMED_OUT.to_string()]
        );
        assert!(transcripts.is_empty(), "timeout must not touch the buffer");
    }

    #[test]
    fn transcribe_success_replaces_buffer_and_completes() {
        let (eng, _, _) = make_engines(false, Ok("test".into()), StubMic::Phrase);
        let (tx, rx) = channel();

        run_action(Mode::Transcribe, "old contents", "en-IN", &eng, &tx);

        let (statuses, transcripts) = drain(rx);
        assert_eq!(transcripts, vec!["test".to_string()]);
        assert_eq!(statuses.last().unwrap(), STATUS_COMPLETE);
    }

    #[test]
    fn transcribe_passes_selected_language() {
        let (eng, _, languages) = make_engines(false, Ok("namaste".into()), StubMic::Phrase);
        let (tx, _rx) = channel();

        run_action(Mode::Transcribe, "", "hi-IN", &eng, &tx);

        assert_eq!(&*languages.lock().unwrap(), &["hi-IN"]);
    }

    #[test]
    fn transcribe_unintelligible_audio_sets_its_status() {
        let (eng, _, _) =
            make_engines(false, Err(|| RecognizeError::Unintelligible), StubMic::Phrase);
        let (tx, rx) = channel();

        run_action(Mode::Transcribe, "", "en-IN", &eng, &tx);

        let (statuses, transcripts) = drain(rx);
        assert_eq!(statuses.last().unwrap(), STATUS_UNINTELLIGIBLE);
        assert!(transcripts.is_empty());
    }

    #[test]
    fn mode_labels_never_go_stale() {
        assert_eq!(Mode::Speak.action_label(), "Speak");
        assert_eq!(Mode::Transcribe.action_label(), "Listen");
        assert_ne!(Mode::Speak.description(), Mode::Transcribe.description());
    }
}
