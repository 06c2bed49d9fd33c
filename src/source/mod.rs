pub mod ytdlp;

pub use ytdlp::YtDlpSource;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use url::Url;

use crate::error::Result;
use crate::segment::TimeOffset;

/// Remote media the pipeline pulls audio and metadata from.
///
/// The three calls are independent; nothing guarantees they observe the same state
/// of the remote resource.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Download the best audio track of `url` to `dest` and return the written path.
    async fn fetch_audio(&self, url: &str, dest: &Path) -> Result<PathBuf>;

    /// Total track duration, in the source's own textual form.
    async fn get_duration(&self, url: &str) -> Result<TimeOffset>;

    /// Human display title, before sanitizing.
    async fn get_title(&self, url: &str) -> Result<String>;

    fn name(&self) -> &'static str;
}

fn is_youtube_host(host: &str) -> bool {
    let h = host.to_ascii_lowercase();
    h == "youtube.com" || h == "youtu.be" || h.ends_with(".youtube.com")
}

/// Extract the media identifier of a video URL.
///
/// Accepts `?v=<id>` on any host, plus `youtu.be/<id>` and YouTube `/shorts/<id>` and
/// `/embed/<id>` paths. The identifier is reduced to `[A-Za-z0-9_-]` since it names
/// the raw download on disk.
pub fn media_id(raw_url: &str) -> Option<String> {
    let url = Url::parse(raw_url.trim()).ok()?;

    let candidate = url
        .query_pairs()
        .find(|(k, _)| k == "v")
        .map(|(_, v)| v.into_owned())
        .or_else(|| {
            let host = url.host_str()?;
            if !is_youtube_host(host) {
                return None;
            }
            let mut segs = url.path_segments()?;
            let first = segs.next().unwrap_or("");
            if host.eq_ignore_ascii_case("youtu.be") {
                return Some(first.to_string());
            }
            match first {
                "shorts" | "embed" | "live" => segs.next().map(str::to_string),
                _ => None,
            }
        })?;

    let id: String = candidate
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_url() {
        assert_eq!(
            media_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            media_id("https://music.youtube.com/watch?list=PL1&v=abc_-123").as_deref(),
            Some("abc_-123")
        );
    }

    #[test]
    fn test_short_forms() {
        assert_eq!(media_id("https://youtu.be/dQw4w9WgXcQ?si=x").as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(
            media_id("https://www.youtube.com/shorts/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            media_id("https://www.youtube.com/embed/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_no_identifier() {
        assert_eq!(media_id("https://www.youtube.com/"), None);
        assert_eq!(media_id("https://www.youtube.com/watch?v="), None);
        assert_eq!(media_id("https://example.com/video/123"), None);
        assert_eq!(media_id("not a url"), None);
        assert_eq!(media_id(""), None);
    }

    #[test]
    fn test_identifier_is_path_safe() {
        assert_eq!(
            media_id("https://www.youtube.com/watch?v=..%2F..%2Fetc").as_deref(),
            Some("etc")
        );
        assert_eq!(media_id("https://www.youtube.com/watch?v=%2F%2E%2E"), None);
    }
}
