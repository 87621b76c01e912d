//! Normalization of raw provider responses.
//!
//! The provider is inconsistent about where it puts things: some fields
//! appear at the top level, some under a nested `data` object, and image
//! results may come as a list or a single URL. Every lookup here follows a
//! fixed priority order; the first non-empty match wins and later
//! candidates are never merged in.

use serde_json::Value;

use crate::job::{JobStatus, Progress};

/// Normalized view of one status response.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub status: JobStatus,
    pub progress: Progress,
    /// Result image URLs. Only extracted when `status` is DONE.
    pub images: Vec<String>,
    /// The untouched provider payload.
    pub raw: Value,
}

impl StatusSnapshot {
    pub fn from_payload(raw: Value) -> Self {
        let status = extract_status(&raw);
        let progress = extract_progress(&raw);
        let images = if status == JobStatus::Done {
            extract_image_urls(&raw)
        } else {
            Vec::new()
        };

        Self {
            status,
            progress,
            images,
            raw,
        }
    }
}

/// Return `value[key]` when it is a non-empty string.
fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Return the nested `data` object, if any.
fn nested(value: &Value) -> Option<&Value> {
    value.get("data").filter(|d| d.is_object())
}

/// `status`, then `data.status`, upper-cased. Missing yields an empty
/// [`JobStatus::Other`], which keeps the poll loop going.
pub fn extract_status(raw: &Value) -> JobStatus {
    let value = non_empty_str(raw, "status")
        .or_else(|| nested(raw).and_then(|d| non_empty_str(d, "status")))
        .unwrap_or("");
    JobStatus::parse(value)
}

/// `progress`, then `data.progress`, then the `"..."` placeholder.
///
/// Only a missing or `null` value falls through; `0` is a real progress.
pub fn extract_progress(raw: &Value) -> Progress {
    raw.get("progress")
        .and_then(Progress::from_value)
        .or_else(|| {
            nested(raw)
                .and_then(|d| d.get("progress"))
                .and_then(Progress::from_value)
        })
        .unwrap_or_else(Progress::placeholder)
}

/// String entries of a non-empty `images` array.
fn image_list(value: &Value) -> Option<Vec<String>> {
    let list = value.get("images")?.as_array()?;
    if list.is_empty() {
        return None;
    }
    Some(
        list.iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
    )
}

/// Extract result image URLs.
///
/// Priority: `images` -> `data.images` -> `uri` -> `data.uri` -> `url` ->
/// `data.url`. Returns an empty list when nothing matches.
pub fn extract_image_urls(raw: &Value) -> Vec<String> {
    let data = nested(raw);

    if let Some(list) = image_list(raw) {
        return list;
    }
    if let Some(list) = data.and_then(image_list) {
        return list;
    }

    for key in ["uri", "url"] {
        if let Some(single) = non_empty_str(raw, key) {
            return vec![single.to_string()];
        }
        if let Some(single) = data.and_then(|d| non_empty_str(d, key)) {
            return vec![single.to_string()];
        }
    }

    Vec::new()
}

/// Job id of a freshly started provider job: `messageId`, `id`, then
/// `data.messageId`.
pub fn extract_job_id(raw: &Value) -> Option<String> {
    non_empty_str(raw, "messageId")
        .or_else(|| non_empty_str(raw, "id"))
        .or_else(|| nested(raw).and_then(|d| non_empty_str(d, "messageId")))
        .map(str::to_string)
}

/// Follow-up action tokens the provider offers for a finished job.
pub fn extract_buttons(raw: &Value) -> Vec<Value> {
    raw.get("buttons")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    // -- status --

    #[test]
    fn status_prefers_top_level() {
        let raw = json!({"status": "processing", "data": {"status": "done"}});
        assert_eq!(extract_status(&raw), JobStatus::Processing);
    }

    #[test]
    fn status_falls_back_to_nested() {
        let raw = json!({"data": {"status": "queued"}});
        assert_eq!(extract_status(&raw), JobStatus::Queued);
    }

    #[test]
    fn status_empty_string_falls_back_to_nested() {
        let raw = json!({"status": "", "data": {"status": "done"}});
        assert_eq!(extract_status(&raw), JobStatus::Done);
    }

    #[test]
    fn missing_status_is_non_terminal() {
        let status = extract_status(&json!({}));
        assert_eq!(status, JobStatus::Other(String::new()));
        assert!(!status.is_terminal());
    }

    // -- progress --

    #[test]
    fn progress_nested_when_top_level_missing() {
        let raw = json!({"status": "processing", "data": {"progress": 42}});
        assert_eq!(extract_progress(&raw), Progress::Numeric(42.into()));
    }

    #[test]
    fn progress_null_falls_through() {
        let raw = json!({"progress": null, "data": {"progress": "70%"}});
        assert_eq!(extract_progress(&raw), Progress::Text("70%".into()));
    }

    #[test]
    fn progress_zero_is_kept() {
        let raw = json!({"progress": 0, "data": {"progress": 90}});
        assert_eq!(extract_progress(&raw), Progress::Numeric(0.into()));
    }

    #[test]
    fn progress_placeholder_when_absent() {
        assert_eq!(extract_progress(&json!({"status": "queued"})), Progress::placeholder());
    }

    // -- images --

    #[test]
    fn top_level_images_win_over_nested() {
        let raw = json!({"images": ["a"], "data": {"images": ["b"]}});
        assert_eq!(extract_image_urls(&raw), vec!["a"]);
    }

    #[test]
    fn empty_top_level_images_fall_through() {
        let raw = json!({"images": [], "data": {"images": ["b", "c"]}});
        assert_eq!(extract_image_urls(&raw), vec!["b", "c"]);
    }

    #[test]
    fn uri_beats_url() {
        let raw = json!({"url": "http://x/url.png", "data": {"uri": "http://x/uri.png"}});
        assert_eq!(extract_image_urls(&raw), vec!["http://x/uri.png"]);
    }

    #[test]
    fn top_level_uri_beats_nested_uri() {
        let raw = json!({"uri": "top", "data": {"uri": "nested"}});
        assert_eq!(extract_image_urls(&raw), vec!["top"]);
    }

    #[test]
    fn nested_url_is_last_resort() {
        let raw = json!({"data": {"url": "http://x/only.png"}});
        assert_eq!(extract_image_urls(&raw), vec!["http://x/only.png"]);
    }

    #[test]
    fn no_images_yields_empty() {
        assert!(extract_image_urls(&json!({"status": "done"})).is_empty());
    }

    // -- snapshot --

    #[test]
    fn snapshot_only_extracts_images_when_done() {
        let raw = json!({"status": "processing", "images": ["a"]});
        let snap = StatusSnapshot::from_payload(raw);
        assert!(snap.images.is_empty());

        let raw = json!({"status": "done", "images": ["a", "b"]});
        let snap = StatusSnapshot::from_payload(raw);
        assert_eq!(snap.status, JobStatus::Done);
        assert_eq!(snap.images, vec!["a", "b"]);
        assert_eq!(snap.progress, Progress::placeholder());
    }

    // -- job id / buttons --

    #[test]
    fn job_id_priority() {
        assert_eq!(
            extract_job_id(&json!({"messageId": "m", "id": "i"})).as_deref(),
            Some("m")
        );
        assert_eq!(extract_job_id(&json!({"id": "i"})).as_deref(), Some("i"));
        assert_eq!(
            extract_job_id(&json!({"data": {"messageId": "d"}})).as_deref(),
            Some("d")
        );
        assert!(extract_job_id(&json!({"error": "nope"})).is_none());
    }

    #[test]
    fn buttons_default_to_empty() {
        assert!(extract_buttons(&json!({})).is_empty());
        assert_eq!(extract_buttons(&json!({"buttons": ["U1", "V1"]})).len(), 2);
    }
}
