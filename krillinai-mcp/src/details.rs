//! Post-processing of subtitle task details.
//!
//! Krillinai reports download links relative to its own root. Before the
//! details reach an MCP client they are rewritten against the current base
//! URL, and finished tasks (`process_percent == 100`) get two extra links for
//! the horizontal and vertical embedded-subtitle videos. Those two links are
//! inferred from Krillinai's output layout and never checked: a task started
//! with `embed_subtitle_video_type = "none"` will answer 404 for both.

use serde_json::{Map, Value, json};

/// Key holding the inferred embedded-video links.
pub const POTENTIAL_EMBEDDED_VIDEO_URLS: &str = "potential_embedded_video_urls";

/// Output file names of the embedded-subtitle videos, with their labels.
const EMBEDDED_VIDEOS: [(&str, &str); 2] = [
    (
        "horizontal_embed.mp4",
        "Horizontal embedded-subtitle video (may not exist)",
    ),
    (
        "vertical_embed.mp4",
        "Vertical embedded-subtitle video (may not exist)",
    ),
];

/// Make `url` absolute against `base_url`.
///
/// URLs already starting with `http` are returned unchanged. A `/` separator
/// is inserted when the relative path lacks one.
pub fn absolutize(base_url: &str, url: &str) -> String {
    if url.starts_with("http") {
        return url.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if url.starts_with('/') {
        format!("{}{}", base, url)
    } else {
        format!("{}/{}", base, url)
    }
}

/// Whether a task reports completion. Integer and float 100 both count.
pub fn is_complete(data: &Map<String, Value>) -> bool {
    data.get("process_percent")
        .and_then(Value::as_f64)
        .is_some_and(|percent| percent == 100.0)
}

/// Links to the embedded-subtitle videos a finished task may have produced.
pub fn potential_embedded_video_urls(base_url: &str, task_id: &str) -> Vec<Value> {
    let base = base_url.trim_end_matches('/');
    EMBEDDED_VIDEOS
        .iter()
        .map(|(file, name)| {
            json!({
                "name": name,
                "download_url": format!("{}/api/file/tasks/{}/output/{}", base, task_id, file),
            })
        })
        .collect()
}

/// Rewrite a task-details `data` object in place.
///
/// - every `subtitle_info[*].download_url` becomes absolute
/// - a non-empty `speech_download_url` becomes absolute
/// - a finished task gains two `potential_embedded_video_urls` entries
///
/// Returns whether the embedded-video links were added.
pub fn rewrite_task_data(data: &mut Map<String, Value>, base_url: &str, task_id: &str) -> bool {
    if let Some(Value::Array(items)) = data.get_mut("subtitle_info") {
        for item in items.iter_mut() {
            if let Some(Value::String(url)) = item.get_mut("download_url") {
                *url = absolutize(base_url, url);
            }
        }
    }

    if let Some(Value::String(url)) = data.get_mut("speech_download_url") {
        if !url.is_empty() {
            *url = absolutize(base_url, url);
        }
    }

    if !is_complete(data) {
        return false;
    }

    let links = potential_embedded_video_urls(base_url, task_id);
    match data.get_mut(POTENTIAL_EMBEDDED_VIDEO_URLS) {
        Some(Value::Array(existing)) => existing.extend(links),
        _ => {
            data.insert(POTENTIAL_EMBEDDED_VIDEO_URLS.to_string(), Value::Array(links));
        }
    }
    true
}

/// Apply [`rewrite_task_data`] to a full upstream envelope.
///
/// Only successful envelopes (`error == 0`) whose `data` is an object are
/// touched. Returns whether the embedded-video links were added.
pub fn rewrite_task_details(envelope: &mut Value, base_url: &str, task_id: &str) -> bool {
    if !crate::envelope::is_success(envelope) {
        return false;
    }
    match envelope.get_mut("data") {
        Some(Value::Object(data)) => rewrite_task_data(data, base_url, task_id),
        _ => false,
    }
}
