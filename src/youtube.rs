/// YouTube URL handling for the content script and popup
use url::Url;

const WATCH_HOST: &str = "www.youtube.com";

/// Extract the `v` parameter of a YouTube watch URL
///
/// Examples:
/// - https://www.youtube.com/watch?v=abc → abc
/// - https://youtube.com/watch?v=abc&t=42 → abc
/// - https://youtu.be/abc → abc
pub fn video_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_lowercase();

    let id = match host.as_str() {
        "youtu.be" => parsed
            .path_segments()?
            .next()
            .map(|segment| segment.to_string()),
        h if h == "youtube.com" || h.ends_with(".youtube.com") => {
            if parsed.path() != "/watch" {
                return None;
            }
            parsed
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())
        }
        _ => None,
    }?;

    if id.is_empty() { None } else { Some(id) }
}

/// Whether the content script should show its surfaces on this page
pub fn is_watch_page(url: &str) -> bool {
    Url::parse(url)
        .map(|parsed| parsed.host_str() == Some(WATCH_HOST) && parsed.path() == "/watch")
        .unwrap_or(false)
}

/// The one URL form sent to the backend for a video
pub fn canonical_watch_url(video_id: &str) -> String {
    format!("https://{}/watch?v={}", WATCH_HOST, video_id)
}

/// Canonicalize any YouTube video URL; `None` when it is not a video URL
pub fn canonicalize(url: &str) -> Option<String> {
    video_id(url).map(|id| canonical_watch_url(&id))
}
