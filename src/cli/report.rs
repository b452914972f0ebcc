//! Per-item results and the batch run summary.

use crate::github::locator::ResourceKind;

/// Outcome of processing one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    /// The item was fetched, rendered, and written.
    Ok,
    /// The item failed somewhere along the way.
    Failed,
}

/// One URL's processing result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemResult {
    /// The input URL as given.
    pub url: String,
    /// Resource kind, once the URL parsed far enough to know it.
    pub kind: Option<ResourceKind>,
    /// Whether the item succeeded.
    pub status: ItemStatus,
    /// Failure description for failed items.
    pub reason: String,
    /// Where the markdown landed (`stdout` or a file path).
    pub output_path: String,
}

impl ItemResult {
    /// Creates a failed placeholder for a URL; filled in as processing
    /// progresses.
    #[must_use]
    pub fn started(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            kind: None,
            status: ItemStatus::Failed,
            reason: String::new(),
            output_path: String::new(),
        }
    }

    /// Formats the one-line status report for this item.
    #[must_use]
    pub fn status_line(&self) -> String {
        let kind = self.kind.map_or("", ResourceKind::as_str);
        match self.status {
            ItemStatus::Ok => format!(
                "OK url={} type={kind} output={}",
                self.url, self.output_path
            ),
            ItemStatus::Failed => format!(
                "FAILED url={} type={kind} reason={}",
                self.url, self.reason
            ),
        }
    }
}

/// Aggregate counters plus per-item outcomes for a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of items processed.
    pub total: usize,
    /// Number of items that succeeded.
    pub succeeded: usize,
    /// Number of items that failed.
    pub failed: usize,
    /// All per-item results, in input order.
    pub items: Vec<ItemResult>,
}

/// Computes aggregate counters from item results.
#[must_use]
pub fn build_summary(items: Vec<ItemResult>) -> RunSummary {
    let total = items.len();
    let succeeded = items
        .iter()
        .filter(|item| item.status == ItemStatus::Ok)
        .count();
    RunSummary {
        total,
        succeeded,
        failed: total - succeeded,
        items,
    }
}

/// Renders the human-readable summary with failure details.
#[must_use]
pub fn format_summary(summary: &RunSummary) -> String {
    let mut lines = vec![format!(
        "OK total={} succeeded={} failed={}",
        summary.total, summary.succeeded, summary.failed
    )];
    for item in &summary.items {
        if item.status == ItemStatus::Failed {
            lines.push(item.status_line());
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{ItemResult, ItemStatus, build_summary, format_summary};
    use crate::github::locator::ResourceKind;

    fn ok_item(url: &str) -> ItemResult {
        ItemResult {
            status: ItemStatus::Ok,
            kind: Some(ResourceKind::Issue),
            output_path: "out/file.md".to_owned(),
            ..ItemResult::started(url)
        }
    }

    fn failed_item(url: &str, reason: &str) -> ItemResult {
        ItemResult {
            reason: reason.to_owned(),
            ..ItemResult::started(url)
        }
    }

    #[test]
    fn summary_counts_successes_and_failures() {
        let summary = build_summary(vec![
            ok_item("https://github.com/o/r/issues/1"),
            failed_item("https://github.com/o/r/issues/2", "boom"),
            ok_item("https://github.com/o/r/issues/3"),
        ]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn formatted_summary_lists_only_failures() {
        let summary = build_summary(vec![
            ok_item("https://github.com/o/r/issues/1"),
            failed_item("https://github.com/o/r/issues/2", "boom"),
        ]);
        let formatted = format_summary(&summary);
        assert_eq!(
            formatted,
            "OK total=2 succeeded=1 failed=1\n\
             FAILED url=https://github.com/o/r/issues/2 type= reason=boom"
        );
    }

    #[test]
    fn status_lines_report_kind_and_output() {
        let item = ok_item("https://github.com/o/r/issues/1");
        assert_eq!(
            item.status_line(),
            "OK url=https://github.com/o/r/issues/1 type=issue output=out/file.md"
        );
    }
}
