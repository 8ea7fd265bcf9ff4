use std::sync::Arc;

use chunkwise_core::{Phase, Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};

const PB_STYLE: &str = "{spinner:.blue} {prefix:>10.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

/// Byte-level bar for a fetch batch. Hidden when `quiet`; indicatif also
/// hides it when stderr is not a terminal.
pub fn fetch_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template(PB_STYLE) {
        pb.set_style(style.tick_chars(TICK).progress_chars(PB_CHARS));
    }
    pb.set_prefix("fetch");
    pb
}

pub fn track(pb: ProgressBar) -> ProgressCallback {
    Arc::new(move |p: &Progress| {
        pb.set_length(p.bytes_total);
        pb.set_position(p.bytes_done);
        let label = match p.phase {
            Phase::Skipped => "present",
            Phase::Downloading => "downloading",
            Phase::Verified => "verified",
        };
        pb.set_message(format!("{} {label} ({}/{})", p.chunk, p.sequence_index + 1, p.chunks_total));
    })
}
