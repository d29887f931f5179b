use url::Url;

/// Known hosts and their display names; matched on the registrable suffix
const KNOWN_PLATFORMS: [(&str, &str); 9] = [
    ("youtube.com", "YouTube"),
    ("youtu.be", "YouTube"),
    ("instagram.com", "Instagram"),
    ("tiktok.com", "TikTok"),
    ("twitter.com", "Twitter"),
    ("x.com", "Twitter"),
    ("vimeo.com", "Vimeo"),
    ("facebook.com", "Facebook"),
    ("fb.watch", "Facebook"),
];

/// Label used for the history `platform` column.
///
/// Known sites get their name, other URLs their bare host (without `www.`),
/// and anything unparseable falls back to `Web`.
pub fn platform_label(url: &str) -> String {
    let Some(host) = Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
    else {
        return "Web".to_string();
    };

    for (domain, name) in KNOWN_PLATFORMS {
        if host == domain || host.ends_with(&format!(".{domain}")) {
            return name.to_string();
        }
    }

    host.strip_prefix("www.").unwrap_or(&host).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_platforms() {
        assert_eq!(platform_label("https://www.youtube.com/watch?v=abc"), "YouTube");
        assert_eq!(platform_label("https://youtu.be/abc"), "YouTube");
        assert_eq!(platform_label("https://m.youtube.com/watch?v=abc"), "YouTube");
        assert_eq!(platform_label("https://www.instagram.com/reel/xyz/"), "Instagram");
        assert_eq!(platform_label("https://x.com/user/status/1"), "Twitter");
        assert_eq!(platform_label("https://vimeo.com/123"), "Vimeo");
    }

    #[test]
    fn test_unknown_host_uses_host() {
        assert_eq!(platform_label("https://www.example.org/v/1"), "example.org");
        assert_eq!(platform_label("https://media.example.org/v/1"), "media.example.org");
    }

    #[test]
    fn test_lookalike_host_is_not_matched() {
        assert_eq!(platform_label("https://notyoutube.com/v"), "notyoutube.com");
    }

    #[test]
    fn test_unparseable_is_web() {
        assert_eq!(platform_label("not a url"), "Web");
        assert_eq!(platform_label(""), "Web");
    }
}
