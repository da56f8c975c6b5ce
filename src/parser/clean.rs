use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static BR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<br\s*/?>").unwrap());
static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<a[^>]*>([^<]*)</a>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static BLANK_LINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

pub fn strip_tags(raw: &str) -> Cow<'_, str> {
    TAG_RE.replace_all(raw, "")
}

/// Strip markup from a post body: line breaks kept, links unwrapped, entities decoded.
pub fn clean_text(raw: &str) -> String {
    let text = BR_RE.replace_all(raw, "\n");
    let text = ANCHOR_RE.replace_all(&text, "$1");
    let text = strip_tags(&text);
    let text = html_escape::decode_html_entities(&text);
    let text = BLANK_LINES_RE.replace_all(&text, "\n\n");
    text.trim().to_string()
}
