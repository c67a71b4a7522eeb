//! Application entry point: VALL-E X studio.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Load the Whisper model, check the phonemizer and load the BPE
//!    vocabulary.
//! 4. Check that the codec / TTS sidecar has a complete checkpoint loaded.
//! 5. Wire the prompt packager and synthesizer.
//! 6. Create the [`tokio`] runtime and spawn the pipeline orchestrator.
//! 7. Run [`eframe::run_native`]; blocks the main thread until the window
//!    is closed.
//!
//! Steps 3 and 4 are fatal: without them no request could succeed.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use eframe::egui;
use tokio::sync::mpsc;

use vallex_studio::{
    app::VallexApp,
    config::{AppConfig, AppPaths},
    model::{RemoteAcousticModel, RemoteCodec, SidecarClient},
    pipeline::{new_shared_state, PipelineCommand, PipelineOrchestrator},
    prompt::{PackagerSettings, PromptPackager},
    stt::{
        find_model_by_id, optimal_threads, ModelPaths, SamplingStrategy, TranscribeParams,
        Transcriber, WhisperEngine,
    },
    synthesis::Synthesizer,
    text::{EspeakPhonemizer, Phonemizer, TextCollater, TextTokenizer},
};

fn load_whisper(config: &AppConfig, paths: &AppPaths) -> Result<WhisperEngine> {
    let info = find_model_by_id(&config.stt.model)
        .ok_or_else(|| anyhow!("unknown Whisper model id {:?}", config.stt.model))?;
    let model_paths = ModelPaths::from_app_paths(paths);
    if !model_paths.is_available(info) {
        return Err(anyhow!(model_paths.missing_model_hint(info)));
    }
    let model_path = model_paths.model_path(info);

    let params = TranscribeParams {
        strategy: SamplingStrategy::beam(config.stt.beam_size),
        n_threads: config.stt.threads.unwrap_or_else(optimal_threads),
        ..TranscribeParams::default()
    };

    let engine = WhisperEngine::load(&model_path, params)
        .with_context(|| format!("loading {} from {}", info.display_name, model_path.display()))?;
    log::info!("Whisper model loaded: {}", model_path.display());
    Ok(engine)
}

fn build_synthesizer(config: &AppConfig, paths: &AppPaths) -> Result<Synthesizer> {
    let whisper = load_whisper(config, paths)?;

    let phonemizer = EspeakPhonemizer::new(config.models.espeak_command.clone());
    let version = phonemizer
        .check_available()
        .context("phonemizer unavailable; install espeak-ng or set models.espeak_command")?;
    log::info!("phonemizer: {} ({version})", phonemizer.name());

    let vocab = config.models.bpe_vocab_path(paths);
    let tokenizer = TextTokenizer::from_file(&vocab, Arc::new(phonemizer))
        .with_context(|| format!("loading BPE vocabulary {}", vocab.display()))?;

    // Blocking HTTP: must run before the tokio runtime exists.
    let sidecar = SidecarClient::from_config(&config.models)
        .context("configuring the model sidecar client")?;
    let sidecar = Arc::new(sidecar);
    sidecar
        .check_ready()
        .with_context(|| format!("model sidecar at {}", sidecar.base_url()))?;

    let device = config.device.device();
    log::info!("compute device: {device}");

    let settings = PackagerSettings {
        prompts_dir: config.prompts.prompts_dir.clone(),
        scratch_dir: config.prompts.scratch_dir(),
        archive_ttl: config.prompts.archive_ttl(),
        device,
    };
    let packager = PromptPackager::new(
        Transcriber::new(Arc::new(whisper)),
        Arc::new(RemoteCodec::new(Arc::clone(&sidecar))),
        tokenizer,
        TextCollater::default(),
        settings,
    );

    Ok(Synthesizer::new(
        Arc::new(packager),
        Arc::new(RemoteAcousticModel::new(sidecar)),
        config.synthesis.decoding(),
        device,
    ))
}

fn native_options() -> eframe::NativeOptions {
    eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("VALL-E X")
            .with_inner_size([720.0, 560.0])
            .with_min_inner_size([480.0, 400.0]),
        ..Default::default()
    }
}

fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("VALL-E X studio starting up");

    // 2. Configuration
    let paths = AppPaths::new();
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3–5. Models
    let synthesizer = Arc::new(build_synthesizer(&config, &paths)?);

    let removed = synthesizer.packager().sweep();
    if removed > 0 {
        log::info!("removed {removed} stale prompt archive(s)");
    }

    // 6. Runtime and orchestrator.  One worker is enough: every request is
    //    awaited on the blocking pool before the next is taken.
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    let shared_state = new_shared_state(config.clone());
    let (command_tx, command_rx) = mpsc::channel::<PipelineCommand>(8);
    let orchestrator = PipelineOrchestrator::new(
        Arc::clone(&shared_state),
        synthesizer,
        config.ui.outputs_dir.clone(),
    );
    rt.spawn(orchestrator.run(command_rx));

    // 7. UI
    eframe::run_native(
        "VALL-E X",
        native_options(),
        Box::new(move |_cc| Ok(Box::new(VallexApp::new(shared_state, command_tx, &config)))),
    )
    .map_err(|e| anyhow!("UI error: {e}"))?;

    log::info!("shutting down");
    Ok(())
}
