//! Transcript rendering.
//!
//! A pure mapping from transcript entries to display blocks. `render` returns a
//! lazy iterator that can be cloned to restart from the beginning.

use std::fmt;

use crate::domain::{EntryId, Role, TranscriptEntry};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Actions offered next to a finished entry with audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    Play,
    Download,
}

impl Affordance {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Download => "download",
        }
    }
}

/// One rendered transcript block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEntry {
    pub id: EntryId,
    pub role_label: &'static str,
    pub timestamp: String,
    pub text: String,
    pub in_progress: bool,
    pub affordances: Vec<Affordance>,
}

/// Render a single entry.
pub fn render_entry(entry: &TranscriptEntry) -> RenderedEntry {
    let affordances = if entry.has_audio() && !entry.in_progress {
        vec![Affordance::Play, Affordance::Download]
    } else {
        Vec::new()
    };

    RenderedEntry {
        id: entry.id,
        role_label: match entry.role {
            Role::User => "You",
            Role::Assistant => "Higgs Audio",
        },
        timestamp: entry.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        text: entry.text.clone(),
        in_progress: entry.in_progress,
        affordances,
    }
}

/// Lazy rendering of a transcript slice.
#[derive(Debug, Clone)]
pub struct Render<'a> {
    entries: std::slice::Iter<'a, TranscriptEntry>,
}

impl Iterator for Render<'_> {
    type Item = RenderedEntry;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(render_entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for Render<'_> {}

pub fn render(entries: &[TranscriptEntry]) -> Render<'_> {
    Render {
        entries: entries.iter(),
    }
}

impl fmt::Display for RenderedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp, self.role_label)?;
        if self.in_progress {
            write!(f, " (working)")?;
        }
        write!(f, "\n  {}", self.text)?;
        if !self.affordances.is_empty() {
            let labels: Vec<&str> = self.affordances.iter().map(Affordance::label).collect();
            write!(f, "\n  [{}]", labels.join("] ["))?;
        }
        Ok(())
    }
}
