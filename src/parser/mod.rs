pub mod clean;
pub mod dates;
pub mod filter;

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::archive::Post;
use clean::clean_text;
use dates::DateIndex;
use filter::NoiseFilter;

/// Characters compared when deciding whether two posts are the same.
pub const DEDUP_PREFIX_CHARS: usize = 80;

// Attribute-less <div> holding only text, <br> and <a> elements.
static CANDIDATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<div>((?:[^<]|<br\s*/?>|<a[^>]*>[^<]*</a>)+)</div>").unwrap()
});
static JAPANESE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ぁ-んァ-ン一-龥]").unwrap());

/// A text block containing kana or kanji, and the byte offset where its `<div>` starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub offset: usize,
    pub raw: &'a str,
}

pub fn candidate_blocks(html: &str) -> Vec<Candidate<'_>> {
    CANDIDATE_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let inner = caps.get(1)?;
            if !JAPANESE_RE.is_match(leading_text(inner.as_str())) {
                return None;
            }
            Some(Candidate {
                offset: whole.start(),
                raw: inner.as_str(),
            })
        })
        .collect()
}

/// Text before the first nested tag; a block counts only if its own caption is Japanese.
fn leading_text(inner: &str) -> &str {
    inner.find('<').map_or(inner, |i| &inner[..i])
}

/// Extract posts from a Facebook export page.
///
/// Pipeline: candidate blocks → clean → noise filter → dedup by prefix →
/// attach nearest preceding date → sort newest first.
pub fn parse_export(html: &str, filter: &NoiseFilter) -> Vec<Post> {
    let dates = DateIndex::build(html);
    let candidates = candidate_blocks(html);
    debug!(
        candidates = candidates.len(),
        date_markers = dates.marker_count(),
        "Scanned export HTML"
    );

    let mut seen: HashSet<String> = HashSet::new();
    let mut posts = Vec::new();

    for cand in candidates {
        let text = clean_text(cand.raw);
        if !filter.is_meaningful(&text) {
            continue;
        }
        if !seen.insert(dedup_key(&text)) {
            continue;
        }
        let date = dates.preceding(cand.offset).map(str::to_string);
        posts.push(Post::exported(text, date));
    }

    dates::sort_newest_first(&mut posts);
    posts
}

fn dedup_key(text: &str) -> String {
    text.chars().take(DEDUP_PREFIX_CHARS).collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::analyze_writing_style;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    const LONG_BODY: &str = "テストメッセージです、これは30文字以上の本文です。今日も一日ありがとうございました！";

    #[test]
    fn single_dated_post() {
        let html = format!(
            r#"<div class="_a72d">1月 28, 2025 1:47:43 PM</div><div>{}</div>"#,
            LONG_BODY
        );
        let posts = parse_export(&html, &NoiseFilter::default());
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].date.as_deref(), Some("1月 28, 2025 1:47:43 PM"));
        assert_eq!(posts[0].text, LONG_BODY);
        assert_eq!(analyze_writing_style(&posts).total_posts, 1);
    }

    #[test]
    fn short_blocks_excluded() {
        let html = "<div>これは短い本文です。</div><div>テストメッセージです、これは30文字以上の本文です。</div>";
        assert!(parse_export(html, &NoiseFilter::default()).is_empty());
    }

    #[test]
    fn profile_update_notices_excluded() {
        let html = "<div>山田太郎さんがプロフィール写真を新しい写真に更新しました。よろしく</div>\
                    <div>山田太郎さんがカバー写真を新しいものに更新しました。ありがとう</div>";
        for _ in 0..2 {
            assert!(parse_export(html, &NoiseFilter::default()).is_empty());
        }
    }

    #[test]
    fn attributed_divs_are_not_candidates() {
        let html = r#"<div class="_2pin">日本語のテキストですがクラス付きなので対象外です。これは候補になりません。</div>"#;
        assert!(candidate_blocks(html).is_empty());
    }

    #[test]
    fn latin_only_blocks_ignored() {
        let html = "<div>This is an English-only status update that is long enough to pass.</div>";
        assert!(candidate_blocks(html).is_empty());
    }

    #[test]
    fn breaks_and_links_kept_inside_block() {
        let html = r#"<div>新しい記事を書きました！<br>ぜひ読んでください。<a href="https://example.com">記事はこちら</a> よろしくお願いします</div>"#;
        let blocks = candidate_blocks(html);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].offset, 0);
        let posts = parse_export(html, &NoiseFilter::default());
        assert_eq!(
            posts[0].text,
            "新しい記事を書きました！\nぜひ読んでください。記事はこちら よろしくお願いします"
        );
    }

    #[test]
    fn japanese_link_text_alone_is_not_enough() {
        let html = r#"<div><a href="https://example.com">日本語リンク</a> followed by a long latin-only caption text here</div>"#;
        assert!(candidate_blocks(html).is_empty());
        assert!(parse_export(html, &NoiseFilter::default()).is_empty());

        let html = r#"<div>Check this out<br>今日の記事です。とても面白い内容なのでぜひ読んでみてください。</div>"#;
        assert!(candidate_blocks(html).is_empty());
    }

    #[test]
    fn duplicates_share_prefix() {
        let prefix = "あ".repeat(80);
        let html = format!("<div>{}一つ目</div><div>{}二つ目</div>", prefix, prefix);
        let posts = parse_export(&html, &NoiseFilter::default());
        assert_eq!(posts.len(), 1);
        assert!(posts[0].text.ends_with("一つ目"));
    }

    #[test]
    fn export_fixture() {
        let html = fixture("export_posts");
        let filter = NoiseFilter::new(Some("山田 太郎"));
        let posts = parse_export(&html, &filter);

        let texts: Vec<&str> = posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(posts.len(), 4, "got: {:#?}", texts);

        // newest first, undated last
        assert_eq!(posts[0].date.as_deref(), Some("3月 2, 2025 8:15:00 AM"));
        assert_eq!(posts[1].date.as_deref(), Some("1月 28, 2025 1:47:43 PM"));
        assert_eq!(posts[2].date.as_deref(), Some("12月 24, 2024 7:30:12 PM"));
        assert!(posts[3].date.is_none());

        assert!(posts[0].text.contains("ライブ配信"));
        assert!(posts[1].text.contains("\n"));
        assert!(texts.iter().all(|t| !t.contains("さんが")));
        assert!(texts.iter().all(|t| !t.starts_with("場所:")));
    }

    #[test]
    fn export_fixture_properties() {
        let html = fixture("export_posts");
        let posts = parse_export(&html, &NoiseFilter::default());
        let tag = Regex::new(r"<[^>]+>").unwrap();

        let mut keys = HashSet::new();
        for p in &posts {
            assert!(!p.text.is_empty());
            assert!(!tag.is_match(&p.text), "markup left in {:?}", p.text);
            assert!(keys.insert(dedup_key(&p.text)));
        }

        let parsed: Vec<_> = posts
            .iter()
            .map(|p| p.date.as_deref().and_then(dates::parse_post_date))
            .collect();
        assert!(parsed.windows(2).all(|w| w[0] >= w[1]));
    }
}
