//! Text preparation for indexing and querying
//!
//! - HTML cleaning: drops comments and non-content elements, then tags and
//!   character entities
//! - Word parsing: lowercase alphabetic words split on whitespace
//! - Document eligibility by file extension

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Elements whose whole content is removed, not just their tags
const HIDDEN_ELEMENTS: [&str; 5] = ["head", "style", "script", "noscript", "svg"];

static COMMENT: LazyLock<Regex> = LazyLock::new(|| compile(r"(?s)<!--.*?-->"));

static ELEMENTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    HIDDEN_ELEMENTS
        .iter()
        .map(|name| compile(&format!(r"(?is)<{name}\b.*?</{name}\s*>")))
        .collect()
});

static TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"(?s)<[^>]*>"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| compile(r"&[^\s;&]+;"));

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| compile(r"[^\p{Alphabetic}\s]+"));

// Patterns are literals exercised by the tests below.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in pattern is valid")
}

/// Whether a file should be indexed (`.html` / `.htm`, any case)
pub fn is_html_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

/// Reduce an HTML document to its visible text
pub fn strip_html(html: &str) -> String {
    let mut text = COMMENT.replace_all(html, " ").into_owned();
    for element in ELEMENTS.iter() {
        text = element.replace_all(&text, " ").into_owned();
    }
    let text = TAG.replace_all(&text, " ");
    ENTITY.replace_all(&text, " ").into_owned()
}

/// Split text into lowercase words, dropping everything but letters
pub fn parse_words(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    NON_WORD
        .replace_all(&lower, "")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Words of an HTML document, in order
pub fn html_words(html: &str) -> Vec<String> {
    parse_words(&strip_html(html))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_file_detection() {
        assert!(is_html_file(Path::new("docs/a.html")));
        assert!(is_html_file(Path::new("docs/A.HTM")));
        assert!(is_html_file(Path::new("x.Html")));
        assert!(!is_html_file(Path::new("notes.txt")));
        assert!(!is_html_file(Path::new("html")));
    }

    #[test]
    fn test_strip_html_removes_markup() {
        let html = r#"<html><head><title>Hidden</title></head>
            <body><!-- note --><p class="x">Hello&nbsp;<b>World</b></p>
            <script type="text/javascript">var secret = 1;</script>
            <STYLE>p { color: red }</STYLE>done</body></html>"#;

        let words = parse_words(&strip_html(html));
        assert_eq!(words, ["hello", "world", "done"]);
    }

    #[test]
    fn test_parse_words_normalizes() {
        assert_eq!(
            parse_words("  The quick-brown FOX, jumped!\n42 times\tÉté "),
            ["the", "quickbrown", "fox", "jumped", "times", "été"]
        );
        assert!(parse_words(" 123 ... ").is_empty());
    }

    #[test]
    fn test_html_words_keeps_order() {
        assert_eq!(html_words("<p>cat dog</p><p>cat</p>"), ["cat", "dog", "cat"]);
    }
}
