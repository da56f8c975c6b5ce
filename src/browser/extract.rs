use std::collections::HashSet;

use anyhow::Result;
use tracing::{debug, info, warn};

/// Post-body selectors, most specific first. The first one matching any element wins.
pub const POST_SELECTORS: &[&str] = &[
    r#"[data-ad-preview="message"]"#,
    r#"div[dir="auto"][style*="text-align"]"#,
    r#"[data-ad-comet-preview="message"]"#,
];

/// Last resort: every auto-direction text block on the page.
pub const FALLBACK_SELECTOR: &str = r#"div[dir="auto"]"#;

const MIN_POST_CHARS: usize = 10;
const FALLBACK_MIN_CHARS: usize = 50;
const FALLBACK_MAX_CHARS: usize = 5000;

/// Button and link labels that show up as text blocks: like, comment, share, friends, follow.
const UI_LABEL_PREFIXES: &[&str] = &["いいね", "コメント", "シェア", "友達", "フォロー"];

/// Anything that can list the inner texts of elements matching a CSS selector.
#[allow(async_fn_in_trait)]
pub trait TextSource {
    /// One entry per matching element; `None` where the element's text could not be read.
    async fn element_texts(&self, selector: &str) -> Result<Vec<Option<String>>>;
}

fn is_post_text(text: &str) -> bool {
    text.chars().count() > MIN_POST_CHARS
}

fn looks_like_post(text: &str) -> bool {
    let len = text.chars().count();
    len > FALLBACK_MIN_CHARS
        && len < FALLBACK_MAX_CHARS
        && !UI_LABEL_PREFIXES.iter().any(|p| text.starts_with(p))
}

/// Order-preserving set of accepted texts.
#[derive(Default)]
struct Collector {
    seen: HashSet<String>,
    texts: Vec<String>,
}

impl Collector {
    fn offer(&mut self, raw: &str, accept: fn(&str) -> bool) {
        let text = raw.trim();
        if text.is_empty() || !accept(text) || self.seen.contains(text) {
            return;
        }
        self.seen.insert(text.to_string());
        self.texts.push(text.to_string());
    }
}

async fn texts_or_empty<S: TextSource>(source: &S, selector: &str) -> Vec<Option<String>> {
    match source.element_texts(selector).await {
        Ok(texts) => texts,
        Err(e) => {
            warn!(selector, "Selector query failed: {e:#}");
            Vec::new()
        }
    }
}

/// Run the selector cascade and return distinct post texts in page order.
pub async fn extract_post_texts<S: TextSource>(source: &S) -> Vec<String> {
    let mut collector = Collector::default();

    for selector in POST_SELECTORS {
        let texts = texts_or_empty(source, selector).await;
        if texts.is_empty() {
            debug!(selector, "No elements");
            continue;
        }
        debug!(selector, elements = texts.len(), "Using selector");
        for text in texts.iter().flatten() {
            collector.offer(text, is_post_text);
        }
        break;
    }

    if collector.texts.is_empty() {
        info!("Standard selectors found nothing, scanning all text blocks");
        for text in texts_or_empty(source, FALLBACK_SELECTOR).await.iter().flatten() {
            collector.offer(text, looks_like_post);
        }
    }

    collector.texts
}
