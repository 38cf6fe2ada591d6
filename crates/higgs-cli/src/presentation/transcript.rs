//! Transcript and history formatting.

use higgs_core::{HistoryEntry, TranscriptEntry, render};

/// Truncates a string to a maximum number of characters, adding "..." if needed.
pub fn truncate_string(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Print entries with their position, which `/save` refers to.
pub fn print_transcript(entries: &[TranscriptEntry]) {
    for (index, rendered) in render(entries).enumerate() {
        println!("#{} {}", index + 1, rendered);
    }
}

/// One line per worker history record.
pub fn format_history(entries: &[HistoryEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| {
            let audio = if e.audio_payload.as_deref().is_some_and(|a| !a.is_empty()) {
                " ♪"
            } else {
                ""
            };
            format!(
                "{:<20} {:<9} {}{audio}",
                e.timestamp,
                e.role,
                truncate_string(&e.content, 60)
            )
        })
        .collect()
}
