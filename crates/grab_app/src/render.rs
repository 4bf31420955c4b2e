//! Plain-text rendering of the view model for the terminal.

use grab_core::{AppViewModel, JobRowView};

pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit_idx])
    }
}

fn progress_bar(percent: u8) -> String {
    let filled = (percent.min(100) / 5) as usize;
    format!("[{}{}]", "=".repeat(filled), " ".repeat(20 - filled))
}

pub(crate) fn job_line(job: &JobRowView) -> String {
    let mut line = format!(
        "{} {:>3}% {} ({}/{})",
        progress_bar(job.percent),
        job.percent,
        job.status,
        job.current,
        job.total
    );
    if job.bundle_size > 0 {
        line.push_str(&format!(", {}", format_bytes(job.bundle_size)));
    }
    line
}

/// One line per non-empty media tab, after a scrape.
pub(crate) fn scrape_summary(view: &AppViewModel) -> Vec<String> {
    let mut lines = vec![format!(
        "{} text results, {} media assets",
        view.result_count, view.asset_count
    )];
    lines.extend(
        view.tabs
            .iter()
            .filter(|tab| tab.count > 0)
            .map(|tab| format!("  {}: {}", tab.label, tab.count)),
    );
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use grab_core::{AssetTabView, MediaType};
    use pretty_assertions::assert_eq;

    fn row(status: &str, current: u64, total: u64, percent: u8, size: u64) -> JobRowView {
        JobRowView {
            token: "abc123".to_string(),
            status: status.to_string(),
            current,
            total,
            percent,
            bundle_size: size,
            ready: false,
        }
    }

    #[test]
    fn sizes_use_binary_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(204_800), "200.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn job_line_shows_bar_and_counts() {
        assert_eq!(
            job_line(&row("Downloading Files", 2, 4, 50, 0)),
            "[==========          ]  50% Downloading Files (2/4)"
        );
        assert_eq!(
            job_line(&row("ready", 4, 4, 100, 2048)),
            "[====================] 100% ready (4/4), 2.0 KB"
        );
    }

    #[test]
    fn summary_skips_empty_tabs() {
        let view = AppViewModel {
            result_count: 2,
            asset_count: 3,
            tabs: vec![
                AssetTabView {
                    media_type: MediaType::Audio,
                    label: MediaType::Audio.label(),
                    count: 0,
                    all_selected: false,
                },
                AssetTabView {
                    media_type: MediaType::Img,
                    label: MediaType::Img.label(),
                    count: 3,
                    all_selected: false,
                },
            ],
            ..AppViewModel::default()
        };
        assert_eq!(
            scrape_summary(&view),
            vec![
                "2 text results, 3 media assets".to_string(),
                "  Images: 3".to_string()
            ]
        );
    }
}
