//! VALL-E X studio window: egui/eframe application.
//!
//! # Architecture
//!
//! [`VallexApp`] is the top-level [`eframe::App`].  It owns the form state of
//! three tabs and one channel endpoint:
//!
//! * `command_tx`: sends [`PipelineCommand`] to the pipeline orchestrator.
//!
//! Progress and results are read from [`SharedState`] every frame; the
//! orchestrator is the only other party touching it.
//!
//! # Tabs
//!
//! | Tab | Inputs | Output |
//! |-----|--------|--------|
//! | Infer from audio | text, language, accent, WAV upload / recording | speech |
//! | Make prompt | prompt name, WAV upload / recording | `.npz` archive path |
//! | Infer from prompt | text, language, accent, `.npz` path | speech |

use std::path::PathBuf;
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::audio::{Playback, RawAudio, Recorder};
use crate::config::AppConfig;
use crate::lang::{Accent, LanguageChoice};
use crate::pipeline::{PipelineCommand, PipelineState, PromptSource, SharedState};

// ---------------------------------------------------------------------------
// Tab
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    InferFromAudio,
    MakePrompt,
    InferFromPrompt,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::InferFromAudio, Tab::MakePrompt, Tab::InferFromPrompt];

    pub fn label(self) -> &'static str {
        match self {
            Tab::InferFromAudio => "Infer from audio",
            Tab::MakePrompt => "Make prompt",
            Tab::InferFromPrompt => "Infer from prompt",
        }
    }

    /// Whether a finished request from this tab produces speech.
    fn speaks(self) -> bool {
        !matches!(self, Tab::MakePrompt)
    }
}

// ---------------------------------------------------------------------------
// Form state
// ---------------------------------------------------------------------------

/// Text, language and accent inputs shared by both synthesis tabs.
struct SpeechForm {
    text: String,
    language: LanguageChoice,
    accent: Accent,
}

impl SpeechForm {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            language: LanguageChoice::default(),
            accent: Accent::default(),
        }
    }

    fn draw(&mut self, ui: &mut egui::Ui, id: &str) {
        ui.label("Text");
        ui.add(
            egui::TextEdit::multiline(&mut self.text)
                .desired_rows(4)
                .desired_width(f32::INFINITY),
        );
        ui.horizontal(|ui| {
            ui.label("Language");
            egui::ComboBox::from_id_salt(format!("{id}-language"))
                .selected_text(self.language.display_name())
                .show_ui(ui, |ui| {
                    for choice in LanguageChoice::ALL {
                        ui.selectable_value(&mut self.language, choice, choice.display_name());
                    }
                });

            ui.label("Accent");
            egui::ComboBox::from_id_salt(format!("{id}-accent"))
                .selected_text(self.accent.display_name())
                .show_ui(ui, |ui| {
                    for accent in Accent::ALL {
                        ui.selectable_value(&mut self.accent, accent, accent.display_name());
                    }
                });
        });
    }
}

/// Build the reference-audio source from the upload field and the last
/// recording.  A blank upload path means "no upload".
pub fn prompt_source(upload_path: &str, recording: Option<&RawAudio>) -> PromptSource {
    let trimmed = upload_path.trim();
    PromptSource {
        uploaded: (!trimmed.is_empty()).then(|| PathBuf::from(trimmed)),
        recorded: recording.cloned(),
    }
}

// ---------------------------------------------------------------------------
// VallexApp
// ---------------------------------------------------------------------------

pub struct VallexApp {
    state: SharedState,
    command_tx: mpsc::Sender<PipelineCommand>,

    tab: Tab,
    audio_form: SpeechForm,
    prompt_form: SpeechForm,
    prompt_name: String,
    upload_path: String,
    archive_path: String,

    // ── Microphone / speaker ─────────────────────────────────────────────
    recorder: Option<Recorder>,
    recording: Option<RawAudio>,
    playback: Option<Playback>,

    /// Tab whose request is in flight.
    pending: Option<Tab>,
    /// Local problems (microphone, full channel) not owned by the pipeline.
    notice: Option<String>,

    autoplay: bool,
    max_record_secs: f32,
}

impl VallexApp {
    pub fn new(
        state: SharedState,
        command_tx: mpsc::Sender<PipelineCommand>,
        config: &AppConfig,
    ) -> Self {
        Self {
            state,
            command_tx,
            tab: Tab::InferFromAudio,
            audio_form: SpeechForm::new(&config.ui.default_text),
            prompt_form: SpeechForm::new(&config.ui.default_text),
            prompt_name: config.ui.default_prompt_name.clone(),
            upload_path: String::new(),
            archive_path: String::new(),
            recorder: None,
            recording: None,
            playback: None,
            pending: None,
            notice: None,
            autoplay: config.ui.autoplay,
            max_record_secs: config.ui.max_record_secs,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────────

    fn submit(&mut self, command: PipelineCommand) {
        let phase = match &command {
            PipelineCommand::MakePrompt { .. } => PipelineState::Packaging,
            _ => PipelineState::Synthesizing,
        };
        match self.command_tx.try_send(command) {
            Ok(()) => {
                // Mark busy right away so the buttons lock before the
                // orchestrator picks the command up.
                let mut st = self.state.lock().unwrap();
                st.pipeline = phase;
                st.error_message = None;
                drop(st);
                self.pending = Some(self.tab);
                self.notice = None;
            }
            Err(e) => {
                log::error!("app: could not queue command: {e}");
                self.notice = Some(format!("Could not start the request: {e}"));
            }
        }
    }

    fn source(&self) -> PromptSource {
        prompt_source(&self.upload_path, self.recording.as_ref())
    }

    /// React to the end of the in-flight request.
    fn poll_completion(&mut self) {
        let Some(tab) = self.pending else {
            return;
        };
        let (busy, done, waveform, prompt) = {
            let st = self.state.lock().unwrap();
            (
                st.pipeline.is_busy(),
                st.pipeline == PipelineState::Done,
                st.last_waveform.clone(),
                st.last_prompt.clone(),
            )
        };
        if busy {
            return;
        }
        self.pending = None;
        if !done {
            return;
        }

        if tab.speaks() {
            if self.autoplay {
                if let Some(waveform) = waveform {
                    self.play(&waveform);
                }
            }
        } else if let Some(path) = prompt {
            // Hand the new archive straight to the third tab.
            self.archive_path = path.display().to_string();
        }
    }

    fn play(&mut self, waveform: &crate::audio::Waveform) {
        match Playback::play(waveform) {
            Ok(p) => self.playback = Some(p),
            Err(e) => {
                log::warn!("app: playback failed: {e}");
                self.notice = Some(format!("Playback failed: {e}"));
            }
        }
    }

    // ── Microphone ───────────────────────────────────────────────────────

    fn toggle_recording(&mut self) {
        if let Some(rec) = self.recorder.take() {
            let audio = rec.finish();
            log::info!("app: recorded {:.1}s", audio.duration_secs());
            self.recording = Some(audio);
            return;
        }
        match Recorder::start(self.max_record_secs) {
            Ok(rec) => {
                self.recorder = Some(rec);
                self.notice = None;
            }
            Err(e) => {
                log::warn!("app: microphone unavailable: {e}");
                self.notice = Some(format!("Microphone unavailable: {e}"));
            }
        }
    }

    // ── Panels ───────────────────────────────────────────────────────────

    fn draw_audio_source(&mut self, ui: &mut egui::Ui, busy: bool) {
        ui.horizontal(|ui| {
            ui.label("Reference WAV");
            ui.add(
                egui::TextEdit::singleline(&mut self.upload_path)
                    .hint_text("path/to/voice.wav")
                    .desired_width(f32::INFINITY),
            );
        });

        ui.horizontal(|ui| {
            let label = match &self.recorder {
                Some(rec) => format!("■ Stop ({:.1}s)", rec.elapsed_secs()),
                None => "● Record".to_string(),
            };
            if ui.add_enabled(!busy, egui::Button::new(label)).clicked() {
                self.toggle_recording();
            }

            if let Some(audio) = &self.recording {
                ui.label(format!("Recorded {:.1}s", audio.duration_secs()));
                if ui.small_button("Clear").clicked() {
                    self.recording = None;
                }
            }
        });
    }

    fn draw_infer_from_audio(&mut self, ui: &mut egui::Ui, busy: bool) {
        self.audio_form.draw(ui, "audio");
        ui.add_space(6.0);
        self.draw_audio_source(ui, busy);
        ui.add_space(6.0);

        let ready = !busy && self.recorder.is_none();
        if ui.add_enabled(ready, egui::Button::new("Generate!")).clicked() {
            let command = PipelineCommand::InferFromAudio {
                text: self.audio_form.text.clone(),
                language: self.audio_form.language,
                accent: self.audio_form.accent,
                source: self.source(),
            };
            self.submit(command);
        }
    }

    fn draw_make_prompt(&mut self, ui: &mut egui::Ui, busy: bool) {
        ui.horizontal(|ui| {
            ui.label("Prompt name");
            ui.text_edit_singleline(&mut self.prompt_name);
        });
        ui.add_space(6.0);
        self.draw_audio_source(ui, busy);
        ui.add_space(6.0);

        let ready = !busy && self.recorder.is_none();
        if ui.add_enabled(ready, egui::Button::new("Make prompt!")).clicked() {
            let command = PipelineCommand::MakePrompt {
                name: self.prompt_name.clone(),
                source: self.source(),
            };
            self.submit(command);
        }
    }

    fn draw_infer_from_prompt(&mut self, ui: &mut egui::Ui, busy: bool) {
        self.prompt_form.draw(ui, "prompt");
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            ui.label("Prompt archive");
            ui.add(
                egui::TextEdit::singleline(&mut self.archive_path)
                    .hint_text("path/to/prompt.npz")
                    .desired_width(f32::INFINITY),
            );
        });
        ui.add_space(6.0);

        let archive = self.archive_path.trim();
        if ui
            .add_enabled(!busy && !archive.is_empty(), egui::Button::new("Generate!"))
            .clicked()
        {
            let command = PipelineCommand::InferFromPrompt {
                text: self.prompt_form.text.clone(),
                language: self.prompt_form.language,
                accent: self.prompt_form.accent,
                archive: PathBuf::from(archive),
            };
            self.submit(command);
        }
    }

    /// Status line, message area and output audio controls.
    fn draw_results(&mut self, ui: &mut egui::Ui) {
        let (pipeline, message, error, waveform, output) = {
            let st = self.state.lock().unwrap();
            (
                st.pipeline.clone(),
                st.message.clone(),
                st.error_message.clone(),
                st.last_waveform.clone(),
                st.last_output.clone(),
            )
        };

        ui.horizontal(|ui| {
            if pipeline.is_busy() {
                ui.spinner();
            }
            ui.label(egui::RichText::new(pipeline.label()).color(state_color(&pipeline)));
        });

        if let Some(notice) = &self.notice {
            ui.label(egui::RichText::new(notice).color(egui::Color32::from_rgb(255, 136, 68)));
        }

        ui.label("Message");
        let mut text = match (&pipeline, error, message) {
            (PipelineState::Error, Some(err), _) => err,
            (_, _, Some(msg)) => msg,
            _ => String::new(),
        };
        ui.add(
            egui::TextEdit::multiline(&mut text)
                .interactive(false)
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );

        if let Some(waveform) = waveform {
            ui.horizontal(|ui| {
                let playing = self.playback.as_ref().is_some_and(|p| !p.is_finished());
                if ui.add_enabled(!playing, egui::Button::new("▶ Play")).clicked() {
                    self.play(&waveform);
                }
                ui.label(format!(
                    "{:.2}s @ {} Hz",
                    waveform.duration_secs(),
                    waveform.sample_rate
                ));
                if let Some(path) = &output {
                    ui.label(
                        egui::RichText::new(path.display().to_string())
                            .color(egui::Color32::from_rgb(140, 140, 140)),
                    );
                }
            });
        }
    }
}

fn state_color(state: &PipelineState) -> egui::Color32 {
    match state {
        PipelineState::Idle => egui::Color32::from_rgb(140, 140, 140),
        PipelineState::Packaging | PipelineState::Synthesizing => {
            egui::Color32::from_rgb(68, 136, 255)
        }
        PipelineState::Done => egui::Color32::from_rgb(80, 200, 120),
        PipelineState::Error => egui::Color32::from_rgb(255, 136, 68),
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for VallexApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_completion();

        let busy = self.state.lock().unwrap().pipeline.is_busy();
        let playing = self.playback.as_ref().is_some_and(|p| !p.is_finished());
        if busy || self.recorder.is_some() || playing || self.pending.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
        if self.playback.as_ref().is_some_and(Playback::is_finished) {
            self.playback = None;
        }

        egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for tab in Tab::ALL {
                    ui.selectable_value(&mut self.tab, tab, tab.label());
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            match self.tab {
                Tab::InferFromAudio => self.draw_infer_from_audio(ui, busy),
                Tab::MakePrompt => self.draw_make_prompt(ui, busy),
                Tab::InferFromPrompt => self.draw_infer_from_prompt(ui, busy),
            }
            ui.separator();
            self.draw_results(ui);
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("app: window closing");
    }
}
