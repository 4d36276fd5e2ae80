//! Command-line demo for the voice-cloning pipeline.
//!
//! Exercises the same four calls a UI would use (train, synthesize, load,
//! list) with console progress printing. Build with `--features cli`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use stimmenklon::audio::validate;
use stimmenklon::backend::zonos;
use stimmenklon::{BackendKind, ManagerConfig, VoiceError, VoiceManager};

#[derive(Parser)]
#[command(
    name = "stimmenklon",
    about = "Voice cloning demo: train voice models and synthesize speech",
    version
)]
struct Cli {
    /// Model directory override (default: ~/.stimmenklon_models)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a new voice model from the audio clips in a directory
    Train {
        #[arg(long)]
        model_name: String,
        #[arg(long)]
        audio_dir: PathBuf,
    },
    /// Synthesize speech with a trained model
    Synthesize {
        #[arg(long)]
        model_name: String,
        #[arg(long)]
        text: String,
        /// Output WAV path (default: a file in the system temp directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List trained voice models
    List,
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), VoiceError> {
    if !zonos::is_installed() {
        eprintln!("note: zonos engine not installed, placeholder synthesis in use");
    }

    let manager = VoiceManager::with_config(ManagerConfig {
        model_dir: cli.model_dir,
        backend: BackendKind::Auto,
    })?;

    match cli.command {
        Command::Train {
            model_name,
            audio_dir,
        } => {
            let clips = collect_clips(&audio_dir)?;
            if clips.is_empty() {
                eprintln!(
                    "no audio files found in {} (supported: wav, mp3, flac, ogg, m4a)",
                    audio_dir.display()
                );
                return Err(VoiceError::NoValidAudioFiles(0));
            }
            println!("found {} audio files:", clips.len());
            for clip in &clips {
                println!("  - {}", clip.display());
            }

            manager.train(&model_name, &clips, |stage, percent| {
                println!("[{percent:3}%] {stage}");
            })?;
            println!("model '{model_name}' trained");
        }
        Command::Synthesize {
            model_name,
            text,
            output,
        } => {
            manager.load_model(&model_name)?;
            let path = manager.synthesize(&text, output.as_deref())?;
            println!("wrote {}", path.display());
        }
        Command::List => {
            let models = manager.list_models()?;
            if models.is_empty() {
                println!("(no trained models)");
            } else {
                for name in models {
                    println!("{name}");
                }
            }
        }
    }
    Ok(())
}

fn collect_clips(dir: &Path) -> Result<Vec<PathBuf>, VoiceError> {
    let mut clips = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && validate::has_accepted_extension(&path) {
            clips.push(path);
        }
    }
    clips.sort();
    Ok(clips)
}
