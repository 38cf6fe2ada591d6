//! Text rendering of the sidebar tree.

use std::fmt::Write as _;

use higgs_core::{SidebarItem, SidebarTree};

/// Indented outline of the tree, expandable items marked with `▸`.
pub fn format_sidebar(tree: &SidebarTree) -> String {
    let mut out = String::new();
    for item in &tree.roots {
        write_item(&mut out, item, 0);
    }
    out
}

fn write_item(out: &mut String, item: &SidebarItem, depth: usize) {
    let marker = if item.is_expandable() { "▸" } else { "•" };
    let _ = writeln!(out, "{}{marker} {}", "  ".repeat(depth), item.label);
    for child in &item.children {
        write_item(out, child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_outline() {
        let tree = SidebarTree::build(&[], &["alice".to_string()], Utc::now());
        let text = format_sidebar(&tree);

        assert!(text.starts_with("• Open chat\n▸ Audio history\n"));
        assert!(text.contains("  • All history (0)\n"));
        assert!(text.contains("▸ Voice library\n  • alice\n  • Add voice\n"));
        assert!(text.ends_with("• Settings\n"));
    }
}
