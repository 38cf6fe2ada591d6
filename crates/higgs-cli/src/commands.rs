//! Main commands enum.

use std::path::PathBuf;

use clap::Subcommand;

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive voice chat
    Chat {
        /// Voice to use for every message
        #[arg(long)]
        voice: Option<String>,
    },

    /// Generate speech from text (argument or stdin)
    Generate {
        /// Text to speak; read from stdin when omitted
        text: Option<String>,
        /// Voice to use
        #[arg(long)]
        voice: Option<String>,
        /// Where to write the audio (defaults to a timestamped file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Clone a voice from a reference recording
    UploadVoice {
        /// Reference recording (wav, mp3, flac, ...)
        #[arg(long)]
        file: Option<PathBuf>,
        /// Name for the new voice
        #[arg(long)]
        name: Option<String>,
        /// Transcript of the reference recording
        #[arg(long)]
        text: Option<String>,
    },

    /// Show the sidebar overview (history buckets and voice library)
    Sidebar,

    /// List available voices
    Voices,

    /// Show or clear the worker's conversation history
    History {
        /// Delete the history instead of listing it
        #[arg(long)]
        clear: bool,
    },

    /// Show the effective configuration
    Config {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Whether the worker must be running before the handler is called.
    ///
    /// `upload-voice` starts it itself once its prompts are answered.
    pub const fn needs_worker(&self) -> bool {
        !matches!(self, Self::Config { .. } | Self::UploadVoice { .. })
    }
}
