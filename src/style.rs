use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::archive::Post;

const TOP_EMOJIS: usize = 10;
const MIN_EXPRESSION_COUNT: usize = 2;

/// Emoji blocks counted by code point: misc symbols & pictographs through
/// supplemental symbols, misc symbols, dingbats.
const EMOJI_RANGES: &[(char, char)] = &[
    ('\u{1F300}', '\u{1F9FF}'),
    ('\u{2600}', '\u{26FF}'),
    ('\u{2700}', '\u{27BF}'),
];

/// (substring, label) pairs counted across all posts.
const EXPRESSIONS: &[(&str, &str)] = &[
    ("w", "w（笑い）"),
    ("！！", "！！（強調）"),
    ("〜", "〜（語尾伸ばし）"),
    ("よろしく", "よろしく"),
    ("ライブ", "ライブ配信"),
    ("AI", "AI関連"),
];

/// Descriptive statistics over one run's posts. Lengths are in characters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleSummary {
    pub total_posts: usize,
    pub average_length: usize,
    pub max_length: usize,
    pub top_emojis: Vec<String>,
    pub expressions: Vec<String>,
}

pub fn analyze_writing_style(posts: &[Post]) -> StyleSummary {
    if posts.is_empty() {
        return StyleSummary::default();
    }

    let lengths: Vec<usize> = posts.iter().map(|p| p.text.chars().count()).collect();
    let all_text = posts
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    StyleSummary {
        total_posts: posts.len(),
        average_length: lengths.iter().sum::<usize>() / lengths.len(),
        max_length: lengths.iter().copied().max().unwrap_or(0),
        top_emojis: top_emojis(&all_text, TOP_EMOJIS),
        expressions: expressions(&all_text),
    }
}

pub fn is_emoji(c: char) -> bool {
    EMOJI_RANGES.iter().any(|&(lo, hi)| (lo..=hi).contains(&c))
}

/// Most frequent emoji characters, ties kept in order of first appearance.
fn top_emojis(text: &str, k: usize) -> Vec<String> {
    // char -> (count, first index)
    let mut counts: HashMap<char, (usize, usize)> = HashMap::new();
    for (i, c) in text.chars().filter(|c| is_emoji(*c)).enumerate() {
        counts.entry(c).or_insert((0, i)).0 += 1;
    }

    let mut ranked: Vec<(char, usize, usize)> =
        counts.into_iter().map(|(c, (n, first))| (c, n, first)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().take(k).map(|(c, ..)| c.to_string()).collect()
}

fn expressions(text: &str) -> Vec<String> {
    EXPRESSIONS
        .iter()
        .filter_map(|(pat, label)| {
            let n = text.matches(pat).count();
            (n >= MIN_EXPRESSION_COUNT).then(|| format!("{}({}回)", label, n))
        })
        .collect()
}
