use anyhow::{anyhow, Result};
use url::Url;

const YOUTUBE_HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "m.youtube.com"];

/// Parse and validate a caller-supplied media URL.
///
/// Only absolute http(s) URLs with a host are accepted.
pub fn parse_request_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| anyhow!("not a valid URL: {}", e))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(anyhow!("unsupported URL scheme: {}", url.scheme()));
    }

    if url.host_str().is_none() {
        return Err(anyhow!("URL has no host"));
    }

    Ok(url)
}

/// Normalize YouTube URL variants to the bare `watch?v=` form.
///
/// Shorts and youtu.be links become watch links; watch links are stripped
/// of everything but the video id. Non-YouTube URLs pass through untouched.
pub fn canonicalize_url(url: Url) -> Url {
    let Some(host) = url.host_str() else {
        return url;
    };

    if host == "youtu.be" {
        let id = url.path().trim_start_matches('/');
        if !id.is_empty() {
            if let Some(watch) = watch_url(id) {
                return watch;
            }
        }
        return url;
    }

    if YOUTUBE_HOSTS.contains(&host) {
        if let Some(id) = url.path().strip_prefix("/shorts/") {
            let id = id.trim_end_matches('/');
            if !id.is_empty() {
                if let Some(watch) = watch_url(id) {
                    return watch;
                }
            }
        }

        if url.path() == "/watch" {
            if let Some(id) = url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())
            {
                if let Some(watch) = watch_url(&id) {
                    return watch;
                }
            }
        }
    }

    url
}

fn watch_url(id: &str) -> Option<Url> {
    Url::parse_with_params("https://www.youtube.com/watch", &[("v", id)]).ok()
}

/// Turn a media title into a safe attachment filename stem.
pub fn sanitize_filename(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .take(100)
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() {
        "media".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_urls() {
        assert!(parse_request_url("https://www.youtube.com/watch?v=abc123").is_ok());
        assert!(parse_request_url("http://example.com/video.mp4").is_ok());
        assert!(parse_request_url("  https://youtu.be/abc123  ").is_ok());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_request_url("not a url").is_err());
        assert!(parse_request_url("").is_err());
        assert!(parse_request_url("ftp://example.com/file").is_err());
        assert!(parse_request_url("file:///etc/passwd").is_err());
        assert!(parse_request_url("youtube.com/watch?v=abc").is_err());
    }

    #[test]
    fn test_canonicalize_shorts() {
        let url = Url::parse("https://www.youtube.com/shorts/dQw4w9WgXcQ").unwrap();
        assert_eq!(
            canonicalize_url(url).as_str(),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_canonicalize_youtu_be() {
        let url = Url::parse("https://youtu.be/dQw4w9WgXcQ?t=10").unwrap();
        assert_eq!(
            canonicalize_url(url).as_str(),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_canonicalize_strips_tracking_params() {
        let url =
            Url::parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PL123&index=2").unwrap();
        assert_eq!(
            canonicalize_url(url).as_str(),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_canonicalize_leaves_other_hosts_alone() {
        let url = Url::parse("https://vimeo.com/12345").unwrap();
        assert_eq!(canonicalize_url(url.clone()), url);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My Video"), "My Video");
        assert_eq!(sanitize_filename("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_filename("  spaced  "), "spaced");
        assert_eq!(sanitize_filename(""), "media");
        assert_eq!(sanitize_filename("///"), "___");
    }

    #[test]
    fn test_sanitize_filename_truncates() {
        let long = "x".repeat(500);
        assert_eq!(sanitize_filename(&long).len(), 100);
    }
}
