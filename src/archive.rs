use std::fs;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::render;
use crate::settings::DataPaths;
use crate::style::{self, StyleSummary};

pub const SOURCE_EXPORT: &str = "Facebook Export";

/// One extracted post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Free-form date as shown in the source, e.g. "1月 28, 2025 1:47:43 PM".
    pub date: Option<String>,
    pub text: String,
    /// When the post was scraped. Not the publish date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Local>>,
}

impl Post {
    /// Post found in an export file.
    pub fn exported(text: String, date: Option<String>) -> Self {
        Self {
            id: None,
            date,
            text,
            captured_at: None,
        }
    }

    /// Post scraped from a live page; `seq` is its 1-based position.
    pub fn captured(seq: usize, text: String, at: DateTime<Local>) -> Self {
        Self {
            id: Some(format!("fb_{}", seq)),
            date: None,
            text,
            captured_at: Some(at),
        }
    }
}

/// The persisted unit: posts plus their style summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archive {
    pub fetched_at: DateTime<Local>,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub total_posts: usize,
    pub posts: Vec<Post>,
    pub writing_style: StyleSummary,
}

impl Archive {
    pub fn build(user_name: &str, source: Option<&str>, posts: Vec<Post>) -> Self {
        let writing_style = style::analyze_writing_style(&posts);
        Self {
            fetched_at: Local::now(),
            user_name: user_name.to_string(),
            source: source.map(str::to_string),
            total_posts: posts.len(),
            posts,
            writing_style,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize archive")
    }
}

/// Overwrite the JSON archive and the Markdown digest.
pub fn save(paths: &DataPaths, archive: &Archive, style_notes: Option<&str>) -> Result<()> {
    fs::create_dir_all(&paths.data_dir)
        .with_context(|| format!("Failed to create {}", paths.data_dir.display()))?;

    fs::write(&paths.posts_json, archive.to_json()?)
        .with_context(|| format!("Failed to write {}", paths.posts_json.display()))?;
    info!(path = %paths.posts_json.display(), posts = archive.total_posts, "Wrote JSON archive");

    let md = render::markdown_digest(archive, style_notes);
    fs::write(&paths.digest_md, md)
        .with_context(|| format!("Failed to write {}", paths.digest_md.display()))?;
    info!(path = %paths.digest_md.display(), "Wrote Markdown digest");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Archive {
        Archive::build(
            "山田太郎",
            Some(SOURCE_EXPORT),
            vec![
                Post::exported("今日はライブ配信でした！！ありがとうございました😊".into(), Some("1月 28, 2025 1:47:43 PM".into())),
                Post::exported("AIの勉強会を開催しました。よろしくお願いします〜".into(), None),
            ],
        )
    }

    #[test]
    fn json_shape() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(json["user_name"], "山田太郎");
        assert_eq!(json["source"], "Facebook Export");
        assert_eq!(json["total_posts"], 2);
        assert_eq!(json["posts"][0]["date"], "1月 28, 2025 1:47:43 PM");
        assert!(json["posts"][1]["date"].is_null());
        assert!(json["posts"][0].get("id").is_none());
        assert!(json["posts"][0].get("captured_at").is_none());
        assert_eq!(json["writing_style"]["total_posts"], 2);
    }

    #[test]
    fn json_keeps_non_ascii_and_indents() {
        let out = sample().to_json().unwrap();
        assert!(out.contains("山田太郎"));
        assert!(!out.contains("\\u"));
        assert!(out.contains("\n  \"user_name\""));
    }

    #[test]
    fn captured_posts_carry_id_and_capture_time() {
        let now = Local::now();
        let p = Post::captured(3, "本文です".into(), now);
        assert_eq!(p.id.as_deref(), Some("fb_3"));
        assert_eq!(p.captured_at, Some(now));
        assert!(p.date.is_none());

        let archive = Archive::build("山田太郎", None, vec![p]);
        let json: serde_json::Value = serde_json::from_str(&archive.to_json().unwrap()).unwrap();
        assert!(json.get("source").is_none());
        assert_eq!(json["posts"][0]["id"], "fb_3");
        assert!(json["posts"][0]["captured_at"].is_string());
    }

    #[test]
    fn json_round_trips() {
        let a = sample();
        let back: Archive = serde_json::from_str(&a.to_json().unwrap()).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn save_overwrites_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(&dir.path().join("social"));

        save(&paths, &sample(), None).unwrap();
        let first = std::fs::read_to_string(&paths.digest_md).unwrap();
        assert!(first.contains("### 2. 日付不明"));

        let smaller = Archive::build(
            "山田太郎",
            Some(SOURCE_EXPORT),
            vec![Post::exported("一件だけの投稿です。これは三十文字以上ある本文になっています。".into(), None)],
        );
        save(&paths, &smaller, None).unwrap();

        let md = std::fs::read_to_string(&paths.digest_md).unwrap();
        assert!(!md.contains("### 2."));
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&paths.posts_json).unwrap()).unwrap();
        assert_eq!(json["total_posts"], 1);
    }
}
