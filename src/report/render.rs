//! Plain-text rendering of report statistics.

use std::fmt::Write;

use hazmap::hazard::{SkippedEntry, Summary};

/// Overall line, unresolved count, then one block per group column.
pub fn render_summary(summary: &Summary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Affected: {} of {} ({})",
        summary.affected, summary.total, summary.share
    );
    if summary.unresolved > 0 {
        let _ = writeln!(out, "Unresolved (not counted): {}", summary.unresolved);
    }

    let mut current: Option<&str> = None;
    for stat in &summary.groups {
        if current != Some(stat.key.as_str()) {
            let _ = writeln!(out, "\n{}", stat.key);
            current = Some(stat.key.as_str());
        }
        let value = if stat.value.is_empty() { "(blank)" } else { &stat.value };
        let _ = writeln!(
            out,
            "  {:<24} {:>5} / {:<5} {}",
            value, stat.affected, stat.total, stat.share
        );
    }
    out
}

pub fn render_skipped(skipped: &[SkippedEntry]) -> String {
    let mut out = String::new();
    for s in skipped {
        let _ = writeln!(
            out,
            "  level {} {} '{}' ({:?})",
            s.entry.level, s.entry.code, s.entry.display_name, s.reason
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hazmap::hazard::{GroupStat, Share};

    #[test]
    fn test_render_summary() {
        let summary = Summary {
            total: 4,
            affected: 3,
            unresolved: 1,
            share: Share::of(3, 4),
            groups: vec![
                GroupStat {
                    key: "strand".into(),
                    value: "STEM".into(),
                    total: 2,
                    affected: 2,
                    share: Share::of(2, 2),
                },
                GroupStat {
                    key: "strand".into(),
                    value: "HUMSS".into(),
                    total: 0,
                    affected: 0,
                    share: Share::of(0, 0),
                },
            ],
        };

        let text = render_summary(&summary);
        assert!(text.starts_with("Affected: 3 of 4 (75%)\n"));
        assert!(text.contains("Unresolved (not counted): 1"));
        assert!(text.contains("\nstrand\n"));
        assert!(text.contains("n/a"));
        assert_eq!(text.matches("strand").count(), 1);
    }
}
