//! Sidebar overview: history buckets and voice library.

use anyhow::Result;
use chrono::Utc;
use higgs_core::SidebarTree;
use tracing::warn;

use crate::bootstrap::CliContext;
use crate::presentation::format_sidebar;

/// Build the tree from the worker's history and voices. Either list may be
/// unavailable; the tree is still shown.
pub async fn build(ctx: &CliContext) -> SidebarTree {
    let backend = ctx.backend();
    let (history, voices) = tokio::join!(backend.get_history(), backend.list_voices());

    if !history.succeeded {
        warn!(error = ?history.error_message, "History unavailable for sidebar");
    }
    if !voices.succeeded {
        warn!(error = ?voices.error_message, "Voices unavailable for sidebar");
    }

    SidebarTree::build(&history.entries, &voices.voices, Utc::now())
}

pub async fn execute(ctx: &CliContext) -> Result<()> {
    let tree = build(ctx).await;
    print!("{}", format_sidebar(&tree));
    Ok(())
}
