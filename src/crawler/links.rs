//! Anchor link extraction

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static ANCHOR_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*"\s*([^"]*?)\s*""#).expect("anchor pattern is valid")
});

/// Drop the fragment; two URLs differing only by fragment are one page
pub fn clean(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

pub fn is_web_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Absolute http(s) links from every `<a href="...">` in `html`, resolved
/// against `base`, in document order
pub fn extract_links(base: &Url, html: &str) -> Vec<Url> {
    ANCHOR_HREF
        .captures_iter(html)
        .filter_map(|captures| {
            let href = captures.get(1)?.as_str();
            match base.join(href) {
                Ok(url) => Some(clean(url)),
                Err(e) => {
                    tracing::debug!("Ignoring link {:?} on {}: {}", href, base, e);
                    None
                }
            }
        })
        .filter(is_web_url)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(links: &[Url]) -> Vec<&str> {
        links.iter().map(Url::as_str).collect()
    }

    #[test]
    fn test_extract_resolves_and_cleans() {
        let base = Url::parse("https://example.com/docs/index.html#top").unwrap();
        let html = r#"
            <a href="guide.html#intro">Guide</a>
            <A class="nav" HREF = " /about ">About</A>
            <a name="x">no link</a>
            <a href="mailto:someone@example.com">mail</a>
            <a href="http://other.org/page?q=1">other</a>
            <link href="style.css">
        "#;

        assert_eq!(
            urls(&extract_links(&base, html)),
            [
                "https://example.com/docs/guide.html",
                "https://example.com/about",
                "http://other.org/page?q=1",
            ]
        );
    }

    #[test]
    fn test_extract_from_page_without_links() {
        let base = Url::parse("http://example.com/").unwrap();
        assert!(extract_links(&base, "<p>plain text</p>").is_empty());
    }
}
