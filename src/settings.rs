use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "fb_archiver";
const ENV_PREFIX: &str = "FB_ARCHIVER";

const AUTH_DIR: &str = "facebook_auth";
const STATE_FILE: &str = "state.json";
const POSTS_FILE: &str = "facebook_posts.json";
const DIGEST_FILE: &str = "facebook_posts_for_notebooklm.md";

/// Runtime settings. Read from `fb_archiver.toml` (optional) and `FB_ARCHIVER_*` env vars.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: PathBuf,
    /// Posts HTML inside an unpacked Facebook export.
    pub export_html: PathBuf,
    pub user_name: String,
    /// Name as it appears in export activity lines ("<name>さんが…").
    pub export_actor_name: Option<String>,
    /// Markdown appended to the digest as style guidance.
    pub style_notes: Option<PathBuf>,
    pub auth_max_age_hours: u64,
    pub scroll_pause_ms: u64,
    pub settle_ms: u64,
    pub chrome_path: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/social"),
            export_html: PathBuf::from(
                "facebook-export/your_facebook_activity/posts/your_posts__check_ins__photos_and_videos_1.html",
            ),
            user_name: "Facebook User".to_string(),
            export_actor_name: None,
            style_notes: None,
            auth_max_age_hours: 24,
            scroll_pause_ms: 1500,
            settle_ms: 3000,
            chrome_path: None,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn paths(&self) -> DataPaths {
        DataPaths::new(&self.data_dir)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn auth_max_age(&self) -> Duration {
        Duration::from_secs(self.auth_max_age_hours.saturating_mul(3600))
    }
}

/// Fixed file layout under the data directory.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPaths {
    pub data_dir: PathBuf,
    pub state_file: PathBuf,
    pub posts_json: PathBuf,
    pub digest_md: PathBuf,
}

impl DataPaths {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            state_file: data_dir.join(AUTH_DIR).join(STATE_FILE),
            posts_json: data_dir.join(POSTS_FILE),
            digest_md: data_dir.join(DIGEST_FILE),
        }
    }
}
