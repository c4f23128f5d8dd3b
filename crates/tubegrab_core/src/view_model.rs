use crate::{AppState, DownloadKind, DownloadLink, FormatOption, JobStatus, MediaDetails};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub url_input: String,
    pub loading: bool,
    pub media: Option<MediaSummaryView>,
    pub formats: Vec<FormatRowView>,
    pub audio_formats: Vec<FormatRowView>,
    pub download_kind: DownloadKind,
    pub download_enabled: bool,
    pub download_label: String,
    pub is_downloading: bool,
    pub progress: Option<ProgressView>,
    pub download_link: Option<DownloadLink>,
    pub error: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSummaryView {
    Single {
        title: String,
        duration: String,
        uploader: String,
        views: String,
        thumbnail_url: Option<String>,
    },
    Playlist {
        title: String,
        item_count: usize,
        /// `(title, duration)` of the entries the service listed.
        entries: Vec<(String, String)>,
        /// Items counted by the service but not listed.
        more: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRowView {
    pub format_id: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressView {
    pub percent: u8,
    pub text: String,
    pub failed: bool,
}

impl AppViewModel {
    pub(crate) fn from_state(state: &AppState) -> Self {
        let selected = state.selected_format.as_deref();
        let (formats, audio_formats) = match &state.media_info {
            Some(info) => (
                format_rows(&info.formats, selected),
                format_rows(&info.audio_formats, selected),
            ),
            None => (Vec::new(), Vec::new()),
        };
        let playlist = state
            .media_info
            .as_ref()
            .is_some_and(|info| info.is_playlist());

        Self {
            url_input: state.url_input.clone(),
            loading: state.loading,
            media: state.media_info.as_ref().map(|info| {
                summarize(info.title.as_deref(), &info.details)
            }),
            formats,
            audio_formats,
            download_kind: state.download_kind,
            download_enabled: !state.is_downloading && selected.is_some(),
            download_label: download_label(
                state.is_downloading,
                selected.is_some(),
                playlist,
                state.download_kind,
            ),
            is_downloading: state.is_downloading,
            progress: state.last_status.as_ref().map(progress_view),
            download_link: state.download_link.clone(),
            error: state.error.as_ref().map(ToString::to_string),
            dirty: state.dirty,
        }
    }
}

fn format_rows(formats: &[FormatOption], selected: Option<&str>) -> Vec<FormatRowView> {
    formats
        .iter()
        .map(|format| FormatRowView {
            format_id: format.format_id.clone(),
            label: format.label.clone(),
            selected: selected == Some(format.format_id.as_str()),
        })
        .collect()
}

fn summarize(title: Option<&str>, details: &MediaDetails) -> MediaSummaryView {
    match details {
        MediaDetails::Single {
            duration_seconds,
            uploader,
            view_count,
            thumbnail_url,
        } => MediaSummaryView::Single {
            title: title.unwrap_or("Unknown Title").to_string(),
            duration: duration_seconds
                .filter(|secs| *secs > 0)
                .map(format_duration)
                .unwrap_or_else(|| "Unknown".to_string()),
            uploader: uploader
                .clone()
                .unwrap_or_else(|| "Unknown Uploader".to_string()),
            views: view_count
                .filter(|views| *views > 0)
                .map(format_views)
                .unwrap_or_else(|| "Unknown".to_string()),
            thumbnail_url: thumbnail_url.clone().filter(|url| !url.is_empty()),
        },
        MediaDetails::Playlist {
            item_count,
            entries,
        } => MediaSummaryView::Playlist {
            title: title.unwrap_or("Playlist").to_string(),
            item_count: *item_count,
            entries: entries
                .iter()
                .map(|entry| {
                    (
                        entry
                            .title
                            .clone()
                            .unwrap_or_else(|| "Unknown Title".to_string()),
                        format_duration(entry.duration_seconds.unwrap_or(0)),
                    )
                })
                .collect(),
            more: item_count.saturating_sub(entries.len()),
        },
    }
}

fn download_label(
    downloading: bool,
    has_selection: bool,
    playlist: bool,
    kind: DownloadKind,
) -> String {
    if downloading {
        return "Downloading...".to_string();
    }
    if !has_selection {
        return "Select a format".to_string();
    }
    let mut label = String::from("Download");
    if playlist {
        label.push_str(" Playlist");
    }
    label.push_str(match kind {
        DownloadKind::Video => " Video",
        DownloadKind::Audio => " Audio",
    });
    label
}

fn progress_view(status: &JobStatus) -> ProgressView {
    match status {
        JobStatus::Starting => ProgressView {
            percent: 0,
            text: "Starting download...".to_string(),
            failed: false,
        },
        JobStatus::Downloading { percent } => ProgressView {
            percent: *percent,
            text: format!("Downloading: {percent}%"),
            failed: false,
        },
        JobStatus::Processing => ProgressView {
            percent: 100,
            text: "Processing file...".to_string(),
            failed: false,
        },
        JobStatus::Complete { .. } => ProgressView {
            percent: 100,
            text: "Download complete!".to_string(),
            failed: false,
        },
        JobStatus::Failed { message } => ProgressView {
            percent: 100,
            text: format!("Error: {}", message.as_deref().unwrap_or("Unknown error")),
            failed: true,
        },
    }
}

/// Formats seconds as `m:ss`, or `h:mm:ss` from one hour up.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

pub fn format_views(views: u64) -> String {
    if views >= 1_000_000 {
        format!("{:.1}M views", views as f64 / 1_000_000.0)
    } else if views >= 1_000 {
        format!("{:.1}K views", views as f64 / 1_000.0)
    } else {
        format!("{views} views")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_switch_to_hours() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(65), "1:05");
        assert_eq!(format_duration(3600 + 2 * 60 + 3), "1:02:03");
    }

    #[test]
    fn views_use_compact_suffixes() {
        assert_eq!(format_views(12), "12 views");
        assert_eq!(format_views(3_400), "3.4K views");
        assert_eq!(format_views(1_240_000), "1.2M views");
    }

    #[test]
    fn download_label_reflects_kind_and_playlist() {
        assert_eq!(
            download_label(false, true, true, DownloadKind::Audio),
            "Download Playlist Audio"
        );
        assert_eq!(
            download_label(false, true, false, DownloadKind::Video),
            "Download Video"
        );
        assert_eq!(
            download_label(false, false, false, DownloadKind::Video),
            "Select a format"
        );
        assert_eq!(
            download_label(true, true, false, DownloadKind::Video),
            "Downloading..."
        );
    }
}
