use std::collections::HashMap;
use std::io::{self, Write};

use tubegrab_core::{AppViewModel, DownloadKind, FormatRowView, MediaSummaryView};

/// Screen regions, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Loading,
    Media,
    Formats,
    Download,
    Progress,
    Link,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionUpdate {
    pub section: Section,
    pub lines: Vec<String>,
}

pub fn render(view: &AppViewModel) -> Vec<SectionUpdate> {
    let mut updates = Vec::new();

    updates.push(SectionUpdate {
        section: Section::Loading,
        lines: if view.loading {
            vec!["Fetching media information...".to_string()]
        } else {
            Vec::new()
        },
    });

    updates.push(SectionUpdate {
        section: Section::Media,
        lines: view.media.as_ref().map(media_lines).unwrap_or_default(),
    });

    updates.push(SectionUpdate {
        section: Section::Formats,
        lines: format_lines(view),
    });

    updates.push(SectionUpdate {
        section: Section::Download,
        lines: if view.media.is_some() {
            let hint = if view.download_enabled {
                " (type 'download')"
            } else {
                ""
            };
            vec![format!("[{}]{}", view.download_label, hint)]
        } else {
            Vec::new()
        },
    });

    updates.push(SectionUpdate {
        section: Section::Progress,
        lines: view
            .progress
            .as_ref()
            .map(|progress| vec![format!("{} {}", progress_bar(progress.percent), progress.text)])
            .unwrap_or_default(),
    });

    updates.push(SectionUpdate {
        section: Section::Link,
        lines: view
            .download_link
            .as_ref()
            .map(|link| vec![format!("Download {} from {}", link.file_name, link.url)])
            .unwrap_or_default(),
    });

    updates.push(SectionUpdate {
        section: Section::Error,
        lines: view
            .error
            .as_ref()
            .map(|error| vec![format!("Error: {error} (type 'dismiss' to clear)")])
            .unwrap_or_default(),
    });

    updates
}

fn media_lines(media: &MediaSummaryView) -> Vec<String> {
    match media {
        MediaSummaryView::Single {
            title,
            duration,
            uploader,
            views,
            thumbnail_url,
        } => {
            let mut lines = vec![
                title.clone(),
                format!("  {duration} | {uploader} | {views}"),
            ];
            if let Some(url) = thumbnail_url {
                lines.push(format!("  Thumbnail: {url}"));
            }
            lines
        }
        MediaSummaryView::Playlist {
            title,
            item_count,
            entries,
            more,
        } => {
            let mut lines = vec![format!("Playlist: {title} ({item_count} videos)")];
            lines.extend(
                entries
                    .iter()
                    .enumerate()
                    .map(|(i, (name, duration))| format!("  {}. {} ({})", i + 1, name, duration)),
            );
            if *more > 0 {
                lines.push(format!("  ...and {more} more"));
            }
            lines
        }
    }
}

fn format_lines(view: &AppViewModel) -> Vec<String> {
    if view.media.is_none() {
        return Vec::new();
    }
    let (heading, rows, other) = match view.download_kind {
        DownloadKind::Video => ("Video formats", &view.formats, "audio"),
        DownloadKind::Audio => ("Audio formats", &view.audio_formats, "video"),
    };

    let mut lines = vec![format!("{heading} (type '{other}' to switch):")];
    if rows.is_empty() {
        lines.push("  none offered".to_string());
    }
    lines.extend(rows.iter().enumerate().map(|(i, row)| format_row(i + 1, row)));
    lines
}

fn format_row(number: usize, row: &FormatRowView) -> String {
    let marker = if row.selected { '*' } else { ' ' };
    if row.label == row.format_id {
        format!(" {marker}{number:>2}. {}", row.label)
    } else {
        format!(" {marker}{number:>2}. {} [{}]", row.label, row.format_id)
    }
}

fn progress_bar(percent: u8) -> String {
    const WIDTH: usize = 20;
    let filled = usize::from(percent.min(100)) * WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(WIDTH - filled))
}

/// Prints only the sections whose text changed since the last draw.
#[derive(Debug, Default)]
pub struct Screen {
    shown: HashMap<Section, Vec<String>>,
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lines that need printing for this view.
    pub fn changes(&mut self, view: &AppViewModel) -> Vec<String> {
        let mut out = Vec::new();
        for update in render(view) {
            let previous = self.shown.get(&update.section);
            if previous == Some(&update.lines) {
                continue;
            }
            if update.lines.is_empty() && previous.is_none() {
                continue;
            }
            out.extend(update.lines.iter().cloned());
            self.shown.insert(update.section, update.lines);
        }
        out
    }

    pub fn draw(&mut self, view: &AppViewModel, mut out: impl Write) -> io::Result<()> {
        for line in self.changes(view) {
            writeln!(out, "{line}")?;
        }
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tubegrab_core::{DownloadLink, ProgressView};

    fn single() -> MediaSummaryView {
        MediaSummaryView::Single {
            title: "Clip".to_string(),
            duration: "2:05".to_string(),
            uploader: "someone".to_string(),
            views: "4.2K views".to_string(),
            thumbnail_url: None,
        }
    }

    fn loaded_view() -> AppViewModel {
        AppViewModel {
            media: Some(single()),
            formats: vec![
                FormatRowView {
                    format_id: "best".to_string(),
                    label: "Best Quality (Video)".to_string(),
                    selected: true,
                },
                FormatRowView {
                    format_id: "18".to_string(),
                    label: "18".to_string(),
                    selected: false,
                },
            ],
            download_enabled: true,
            download_label: "Download Video".to_string(),
            ..AppViewModel::default()
        }
    }

    fn lines_for(view: &AppViewModel, section: Section) -> Vec<String> {
        render(view)
            .into_iter()
            .find(|update| update.section == section)
            .map(|update| update.lines)
            .unwrap_or_default()
    }

    #[test]
    fn format_rows_are_numbered_with_selection_marker() {
        assert_eq!(
            lines_for(&loaded_view(), Section::Formats),
            vec![
                "Video formats (type 'audio' to switch):".to_string(),
                " * 1. Best Quality (Video) [best]".to_string(),
                "   2. 18".to_string(),
            ]
        );
    }

    #[test]
    fn playlist_lists_entries_and_remainder() {
        let view = AppViewModel {
            media: Some(MediaSummaryView::Playlist {
                title: "Mix".to_string(),
                item_count: 12,
                entries: vec![("one".to_string(), "1:01".to_string())],
                more: 11,
            }),
            ..AppViewModel::default()
        };
        assert_eq!(
            lines_for(&view, Section::Media),
            vec![
                "Playlist: Mix (12 videos)".to_string(),
                "  1. one (1:01)".to_string(),
                "  ...and 11 more".to_string(),
            ]
        );
    }

    #[test]
    fn progress_and_link_lines() {
        let view = AppViewModel {
            progress: Some(ProgressView {
                percent: 50,
                text: "Downloading: 50%".to_string(),
                failed: false,
            }),
            download_link: Some(DownloadLink {
                url: "http://127.0.0.1:5000/get_file/1".to_string(),
                file_name: "clip.mp4".to_string(),
            }),
            ..AppViewModel::default()
        };
        assert_eq!(
            lines_for(&view, Section::Progress),
            vec!["[##########----------] Downloading: 50%".to_string()]
        );
        assert_eq!(
            lines_for(&view, Section::Link),
            vec!["Download clip.mp4 from http://127.0.0.1:5000/get_file/1".to_string()]
        );
    }

    #[test]
    fn screen_prints_only_changed_sections() {
        let mut screen = Screen::new();
        assert!(screen.changes(&AppViewModel::default()).is_empty());

        let mut view = loaded_view();
        let first = screen.changes(&view);
        assert_eq!(first[0], "Clip");
        assert!(first.contains(&"[Download Video] (type 'download')".to_string()));

        assert!(screen.changes(&view).is_empty());

        view.error = Some("Video unavailable".to_string());
        assert_eq!(
            screen.changes(&view),
            vec!["Error: Video unavailable (type 'dismiss' to clear)".to_string()]
        );

        // A cleared section is remembered as empty and prints nothing.
        view.error = None;
        assert!(screen.changes(&view).is_empty());
    }

    #[test]
    fn draw_writes_lines() {
        let mut screen = Screen::new();
        let mut buffer = Vec::new();
        screen.draw(&loaded_view(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("Clip\n"));
    }
}
