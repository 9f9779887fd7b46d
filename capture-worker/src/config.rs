use std::path::PathBuf;

use clap::Parser;

use relay_proto::{DEFAULT_CLEANUP_AGE_SECS, DEFAULT_FREQUENCY_SECS};

#[derive(Debug, Parser)]
#[command(name = "capture-worker", about = "Privileged internal worker: periodic capture + on-demand OCR")]
pub struct CliArgs {
    /// relay-server URL to connect to as the internal client.
    #[arg(long, default_value = "http://127.0.0.1:5348")]
    pub server_url: String,

    /// Directory captures are written to and read back from.
    #[arg(long, default_value = "./screenshots")]
    pub screenshots_dir: PathBuf,

    /// Initial capture cadence, in seconds (clamped to [0.1, 60.0]).
    #[arg(long, default_value_t = DEFAULT_FREQUENCY_SECS)]
    pub frequency: f64,

    /// Age after which a capture file is pruned, in seconds.
    #[arg(long, default_value_t = DEFAULT_CLEANUP_AGE_SECS)]
    pub cleanup_age_secs: u64,

    /// Directory holding the sentinel files (defaults to screenshots_dir's parent / .tmp).
    #[arg(long)]
    pub sentinel_dir: Option<PathBuf>,

    /// Path to a frequency config JSON file (`{"frequency": <seconds>}`),
    /// re-read whenever the reload sentinel appears.
    #[arg(long)]
    pub frequency_config: Option<PathBuf>,

    /// Emit structured JSON logs instead of human-readable ones.
    #[arg(long)]
    pub log_json: bool,
}

impl CliArgs {
    pub fn sentinel_dir(&self) -> PathBuf {
        self.sentinel_dir
            .clone()
            .unwrap_or_else(|| self.screenshots_dir.join(".tmp"))
    }
}
