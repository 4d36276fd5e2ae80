//! Voice-model lifecycle orchestration.
//!
//! [`VoiceManager`] sequences the training pipeline (validate → combine →
//! embed → persist) and synthesis, each on its own background worker thread.
//! Workers report ordered [`TrainingUpdate`] / [`SynthesisUpdate`] messages
//! over an `mpsc` channel, so a UI thread polls its receiver and is never
//! touched from the worker. At most one training run and one synthesis run
//! may be in flight per manager; a second request is rejected immediately,
//! not queued. Nothing can cancel a running operation; process exit simply
//! abandons the detached worker.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use derive_builder::Builder;

use crate::audio::{combine, validate};
use crate::backend::{self, BackendKind, SpeakerEmbedding, TtsBackend};
use crate::error::VoiceError;
use crate::store::{ModelStore, VoiceModel};

/// Maximum accepted length of a model name.
pub const MAX_MODEL_NAME_LEN: usize = 50;

/// Stages of a training run. Each stage owns a band of the 0–100 progress
/// scale; within one run the reported percentage never decreases and ends at
/// 100 on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingStage {
    Validation,
    Combination,
    Embedding,
    Persistence,
}

impl TrainingStage {
    /// Map a 0.0–1.0 completion fraction within this stage onto the overall
    /// progress scale.
    pub fn percent(self, fraction: f32) -> u8 {
        let (lo, hi) = match self {
            TrainingStage::Validation => (0.0, 20.0),
            TrainingStage::Combination => (25.0, 65.0),
            TrainingStage::Embedding => (65.0, 90.0),
            TrainingStage::Persistence => (90.0, 100.0),
        };
        (lo + (hi - lo) * fraction.clamp(0.0, 1.0)).round() as u8
    }
}

impl fmt::Display for TrainingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrainingStage::Validation => "validating samples",
            TrainingStage::Combination => "combining audio",
            TrainingStage::Embedding => "extracting speaker embedding",
            TrainingStage::Persistence => "saving model",
        };
        f.write_str(label)
    }
}

/// Messages a training worker sends back to its caller, in order.
#[derive(Debug)]
pub enum TrainingUpdate {
    Progress { stage: TrainingStage, percent: u8 },
    Done { model_name: String },
    Failed(VoiceError),
}

/// Messages a synthesis worker sends back to its caller.
#[derive(Debug)]
pub enum SynthesisUpdate {
    Done { path: PathBuf, duration_secs: f64 },
    Failed(VoiceError),
}

/// Construction-time options for [`VoiceManager`].
#[derive(Debug, Clone, Default, Builder)]
#[builder(setter(into, strip_option), default)]
pub struct ManagerConfig {
    /// Model directory override; `None` uses the per-user default.
    pub model_dir: Option<PathBuf>,
    /// Backend the manager is built with; resolved once, at construction.
    pub backend: BackendKind,
}

/// The voice in use for synthesis, set by a successful train or load.
#[derive(Debug, Clone)]
struct LoadedVoice {
    name: String,
    embedding: SpeakerEmbedding,
}

/// Clears a single-flight flag when the worker exits, panics included.
struct FlagGuard(Arc<AtomicBool>);

impl Drop for FlagGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Orchestrator for the voice-model lifecycle: train, synthesize, load,
/// list.
pub struct VoiceManager {
    store: ModelStore,
    backend: Arc<dyn TtsBackend>,
    loaded: Arc<Mutex<Option<LoadedVoice>>>,
    training_active: Arc<AtomicBool>,
    synthesis_active: Arc<AtomicBool>,
}

impl VoiceManager {
    /// Manager with the default store location and auto-selected backend.
    pub fn new() -> Result<Self, VoiceError> {
        Self::with_config(ManagerConfig::default())
    }

    pub fn with_config(config: ManagerConfig) -> Result<Self, VoiceError> {
        let store = match config.model_dir {
            Some(dir) => ModelStore::open(dir),
            None => ModelStore::default_location(),
        };
        let backend = backend::select(config.backend)?;
        Ok(Self::with_parts(store, backend))
    }

    /// Manager from explicit collaborators. This is the substitution seam:
    /// hand in a temp-directory store or a scripted backend.
    pub fn with_parts(store: ModelStore, backend: Arc<dyn TtsBackend>) -> Self {
        Self {
            store,
            backend,
            loaded: Arc::new(Mutex::new(None)),
            training_active: Arc::new(AtomicBool::new(false)),
            synthesis_active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Name of the model a successful train or load left active, if any.
    pub fn loaded_model(&self) -> Option<String> {
        self.loaded
            .lock()
            .expect("loaded-voice mutex poisoned")
            .as_ref()
            .map(|v| v.name.clone())
    }

    pub fn is_training(&self) -> bool {
        self.training_active.load(Ordering::SeqCst)
    }

    pub fn is_synthesizing(&self) -> bool {
        self.synthesis_active.load(Ordering::SeqCst)
    }

    /// Start a training run on a background worker.
    ///
    /// Returns the receiver for the worker's ordered updates. The final
    /// message is always `Done` or `Failed`; a successful run also leaves
    /// the new model loaded for synthesis. Fails fast, without spawning,
    /// on an invalid name, an empty path list, or a training run already in
    /// flight.
    pub fn start_training(
        &self,
        name: &str,
        paths: &[PathBuf],
    ) -> Result<Receiver<TrainingUpdate>, VoiceError> {
        validate_model_name(name)?;
        if paths.is_empty() {
            return Err(VoiceError::NoValidAudioFiles(0));
        }
        if self.training_active.swap(true, Ordering::SeqCst) {
            return Err(VoiceError::AlreadyInProgress("training"));
        }

        let worker = TrainingWorker {
            name: name.to_string(),
            paths: paths.to_vec(),
            store: self.store.clone(),
            backend: Arc::clone(&self.backend),
            loaded: Arc::clone(&self.loaded),
        };
        let active = Arc::clone(&self.training_active);
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let _guard = FlagGuard(active);
            match worker.run(&tx) {
                Ok(()) => {
                    let _ = tx.send(TrainingUpdate::Done {
                        model_name: worker.name.clone(),
                    });
                }
                Err(err) => {
                    log::error!("training '{}' failed: {err}", worker.name);
                    let _ = tx.send(TrainingUpdate::Failed(err));
                }
            }
        });

        Ok(rx)
    }

    /// Blocking training for non-UI callers: drains the update channel on
    /// the calling thread, forwarding progress to `on_progress`.
    pub fn train<F>(&self, name: &str, paths: &[PathBuf], mut on_progress: F) -> Result<(), VoiceError>
    where
        F: FnMut(TrainingStage, u8),
    {
        let rx = self.start_training(name, paths)?;
        for update in rx {
            match update {
                TrainingUpdate::Progress { stage, percent } => on_progress(stage, percent),
                TrainingUpdate::Done { .. } => return Ok(()),
                TrainingUpdate::Failed(err) => return Err(err),
            }
        }
        Err(VoiceError::WorkerLost)
    }

    /// Start synthesizing `text` with the loaded voice on a background
    /// worker. The output WAV goes to `output_path`, or to
    /// `<tmp>/stimmenklon_<model>.wav` when none is given.
    pub fn start_synthesis(
        &self,
        text: &str,
        output_path: Option<&Path>,
    ) -> Result<Receiver<SynthesisUpdate>, VoiceError> {
        let voice = self
            .loaded
            .lock()
            .expect("loaded-voice mutex poisoned")
            .clone()
            .ok_or(VoiceError::NoModelLoaded)?;

        if self.synthesis_active.swap(true, Ordering::SeqCst) {
            return Err(VoiceError::AlreadyInProgress("synthesis"));
        }

        let out_path = output_path.map(Path::to_path_buf).unwrap_or_else(|| {
            std::env::temp_dir().join(format!("stimmenklon_{}.wav", voice.name))
        });

        let backend = Arc::clone(&self.backend);
        let active = Arc::clone(&self.synthesis_active);
        let text = text.to_string();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let _guard = FlagGuard(active);
            log::info!(
                "synthesizing {} characters with the {} backend",
                text.chars().count(),
                backend.name()
            );
            let result = backend
                .synthesize(&text, &voice.embedding)
                .and_then(|wave| wave.write_wav(&out_path).map(|()| wave.duration_secs()));
            match result {
                Ok(duration_secs) => {
                    let _ = tx.send(SynthesisUpdate::Done {
                        path: out_path,
                        duration_secs,
                    });
                }
                Err(err) => {
                    log::error!("speech synthesis failed: {err}");
                    let _ = tx.send(SynthesisUpdate::Failed(err));
                }
            }
        });

        Ok(rx)
    }

    /// Blocking synthesis for non-UI callers. Returns the output path.
    pub fn synthesize(&self, text: &str, output_path: Option<&Path>) -> Result<PathBuf, VoiceError> {
        let rx = self.start_synthesis(text, output_path)?;
        match rx.recv() {
            Ok(SynthesisUpdate::Done { path, .. }) => Ok(path),
            Ok(SynthesisUpdate::Failed(err)) => Err(err),
            Err(_) => Err(VoiceError::WorkerLost),
        }
    }

    /// Load a stored model and make it the active voice.
    pub fn load_model(&self, name: &str) -> Result<(), VoiceError> {
        let model = self.store.load(name)?;
        log::info!("voice model '{name}' loaded from {}", self.store.dir().display());
        *self.loaded.lock().expect("loaded-voice mutex poisoned") = Some(LoadedVoice {
            name: model.model_name,
            embedding: model.speaker_embedding,
        });
        Ok(())
    }

    /// Names of all stored models.
    pub fn list_models(&self) -> Result<Vec<String>, VoiceError> {
        self.store.list()
    }
}

struct TrainingWorker {
    name: String,
    paths: Vec<PathBuf>,
    store: ModelStore,
    backend: Arc<dyn TtsBackend>,
    loaded: Arc<Mutex<Option<LoadedVoice>>>,
}

impl TrainingWorker {
    fn run(&self, tx: &Sender<TrainingUpdate>) -> Result<(), VoiceError> {
        // A dropped receiver only means nobody is watching; keep going.
        let progress = |stage: TrainingStage, fraction: f32| {
            let _ = tx.send(TrainingUpdate::Progress {
                stage,
                percent: stage.percent(fraction),
            });
        };

        log::info!(
            "starting training for '{}' with {} candidate files",
            self.name,
            self.paths.len()
        );

        let total = self.paths.len();
        let mut valid = Vec::with_capacity(total);
        for (i, path) in self.paths.iter().enumerate() {
            progress(TrainingStage::Validation, i as f32 / total as f32);
            if validate::is_valid_sample(path) {
                log::info!("validated {}", path.display());
                valid.push(path.clone());
            }
        }
        if valid.is_empty() {
            return Err(VoiceError::NoValidAudioFiles(total));
        }

        let combined = combine::combine(&valid, |fraction| {
            progress(TrainingStage::Combination, fraction)
        })?;

        progress(TrainingStage::Embedding, 0.0);
        let embedding = self.backend.extract_embedding(&combined)?;
        progress(TrainingStage::Embedding, 1.0);

        let saved = self
            .store
            .save(&VoiceModel::new(self.name.clone(), embedding.clone()))?;
        log::info!(
            "voice model '{}' trained successfully ({})",
            self.name,
            saved.display()
        );

        *self.loaded.lock().expect("loaded-voice mutex poisoned") = Some(LoadedVoice {
            name: self.name.clone(),
            embedding,
        });
        progress(TrainingStage::Persistence, 1.0);
        Ok(())
    }
}

/// Model names become file names, so the character set is restricted:
/// letters, digits and underscores, at most [`MAX_MODEL_NAME_LEN`]
/// characters.
fn validate_model_name(name: &str) -> Result<(), VoiceError> {
    let ok = !name.is_empty()
        && name.len() <= MAX_MODEL_NAME_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(VoiceError::InvalidModelName(name.to_string()))
    }
}
