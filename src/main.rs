//! vaani — desktop text and speech converter.
//!
//! One form: pick speak or transcribe, type or dictate, and the status line
//! tells you how it went. Speech engines are pluggable backends selected in
//! config.json next to the binary.

mod audio;
mod config;
mod stt;
mod synth;
mod ui;
mod worker;

use std::sync::Arc;

use anyhow::Result;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    log::info!("─── vaani v{} starting ───", env!("CARGO_PKG_VERSION"));

    let cfg = config::load_config();
    log::info!(
        "Config: synth={}, stt={}, language={}",
        cfg.synth.backend,
        cfg.stt.backend,
        cfg.ui.language,
    );

    let engines = Arc::new(worker::Engines {
        synth: synth::create_synthesizer(&cfg.synth)?,
        stt: stt::create_recognizer(&cfg.stt)?,
        mic: Box::new(audio::CpalSource::new(cfg.audio.clone())),
    });

    ui::run(cfg, engines)?;

    log::info!("─── vaani stopped ───");
    Ok(())
}
