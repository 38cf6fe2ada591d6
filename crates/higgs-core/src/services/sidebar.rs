//! Sidebar tree model.
//!
//! Two expandable groups (audio history and voice library) between the
//! open-chat and settings shortcuts. History entries are bucketed by the
//! timestamp the worker recorded.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::domain::HistoryEntry;

/// Action bound to a sidebar item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarCommand {
    OpenChat,
    AudioHistory,
    HistoryToday,
    HistoryThisWeek,
    HistoryAll,
    VoiceLibrary,
    Voice(String),
    AddVoice,
    Settings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarItem {
    pub label: String,
    pub command: SidebarCommand,
    pub children: Vec<SidebarItem>,
}

impl SidebarItem {
    fn leaf(label: impl Into<String>, command: SidebarCommand) -> Self {
        Self {
            label: label.into(),
            command,
            children: Vec::new(),
        }
    }

    pub fn is_expandable(&self) -> bool {
        !self.children.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarTree {
    pub roots: Vec<SidebarItem>,
}

impl SidebarTree {
    pub fn build(history: &[HistoryEntry], voices: &[String], now: DateTime<Utc>) -> Self {
        let (today, week) = history
            .iter()
            .filter_map(|e| parse_timestamp(&e.timestamp))
            .fold((0usize, 0usize), |(today, week), ts| {
                let is_today = ts.date_naive() == now.date_naive();
                let is_week = ts <= now && now - ts < Duration::days(7);
                (today + usize::from(is_today), week + usize::from(is_week))
            });

        let history_group = SidebarItem {
            label: "Audio history".to_string(),
            command: SidebarCommand::AudioHistory,
            children: vec![
                SidebarItem::leaf(format!("Today ({today})"), SidebarCommand::HistoryToday),
                SidebarItem::leaf(format!("This week ({week})"), SidebarCommand::HistoryThisWeek),
                SidebarItem::leaf(
                    format!("All history ({})", history.len()),
                    SidebarCommand::HistoryAll,
                ),
            ],
        };

        let mut voice_items: Vec<SidebarItem> = voices
            .iter()
            .map(|v| SidebarItem::leaf(v.clone(), SidebarCommand::Voice(v.clone())))
            .collect();
        voice_items.push(SidebarItem::leaf("Add voice", SidebarCommand::AddVoice));

        let voice_group = SidebarItem {
            label: "Voice library".to_string(),
            command: SidebarCommand::VoiceLibrary,
            children: voice_items,
        };

        Self {
            roots: vec![
                SidebarItem::leaf("Open chat", SidebarCommand::OpenChat),
                history_group,
                voice_group,
                SidebarItem::leaf("Settings", SidebarCommand::Settings),
            ],
        }
    }
}

/// Parse the worker's ISO-8601 timestamps, with or without an offset.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(timestamp: &str) -> HistoryEntry {
        HistoryEntry {
            role: "user".to_string(),
            content: "hi".to_string(),
            audio_payload: None,
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn test_groups_and_buckets() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let history = vec![
            entry("2025-03-10T09:30:00.123456"),
            entry("2025-03-08T09:30:00+00:00"),
            entry("2025-01-01T00:00:00"),
            entry("not a date"),
        ];
        let voices = vec!["voice_1".to_string()];

        let tree = SidebarTree::build(&history, &voices, now);
        assert_eq!(tree.roots.len(), 4);

        let history_group = &tree.roots[1];
        assert!(history_group.is_expandable());
        assert_eq!(history_group.children[0].label, "Today (1)");
        assert_eq!(history_group.children[1].label, "This week (2)");
        assert_eq!(history_group.children[2].label, "All history (4)");

        let voice_group = &tree.roots[2];
        assert_eq!(voice_group.children.len(), 2);
        assert_eq!(
            voice_group.children[0].command,
            SidebarCommand::Voice("voice_1".to_string())
        );
        assert_eq!(voice_group.children[1].command, SidebarCommand::AddVoice);
    }

    #[test]
    fn test_empty_inputs_still_offer_add_voice() {
        let tree = SidebarTree::build(&[], &[], Utc::now());
        assert_eq!(tree.roots[2].children.len(), 1);
        assert!(!tree.roots[0].is_expandable());
    }
}
