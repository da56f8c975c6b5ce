use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::archive::Post;

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<div class="_a72d">([^<]+)</div>"#).unwrap());
// "1月 28, 2025 1:47:43 PM"
static JP_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)月\s*(\d+),\s*(\d+)").unwrap());

struct Marker {
    end: usize,
    text: String,
}

/// Positions of every date marker in an export document, in document order.
pub struct DateIndex {
    markers: Vec<Marker>,
}

impl DateIndex {
    pub fn build(html: &str) -> Self {
        let markers = MARKER_RE
            .captures_iter(html)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some(Marker {
                    end: whole.end(),
                    text: caps[1].to_string(),
                })
            })
            .collect();
        Self { markers }
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Date of the closest marker that ends at or before `offset`.
    pub fn preceding(&self, offset: usize) -> Option<&str> {
        let n = self.markers.partition_point(|m| m.end <= offset);
        n.checked_sub(1).map(|i| self.markers[i].text.as_str())
    }
}

/// Best-effort parse of the export's "M月 D, YYYY" form. Time of day is ignored.
pub fn parse_post_date(raw: &str) -> Option<NaiveDate> {
    let caps = JP_DATE_RE.captures(raw.trim())?;
    let month = caps[1].parse().ok()?;
    let day = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Newest first; posts whose date is missing or unparsable go last, in input order.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by_cached_key(|p| std::cmp::Reverse(p.date.as_deref().and_then(parse_post_date)));
}
