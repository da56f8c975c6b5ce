use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Browser cookies saved after an interactive login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub saved_at: DateTime<Local>,
    pub cookies: Vec<StoredCookie>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    /// Seconds since the Unix epoch; `None` for session cookies.
    pub expires: Option<f64>,
    pub http_only: bool,
    pub secure: bool,
}

impl SessionState {
    pub fn new(cookies: Vec<StoredCookie>) -> Self {
        Self {
            saved_at: Local::now(),
            cookies,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session state {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Corrupt session state {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write session state {}", path.display()))
    }
}

/// Presence and freshness of the saved session, judged by file mtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuthStatus {
    Missing,
    Fresh { age: Duration },
    /// Older than the configured maximum. Still usable, but a new login is advised.
    Stale { age: Duration },
}

pub fn check(path: &Path, max_age: Duration) -> Result<AuthStatus> {
    if !path.exists() {
        return Ok(AuthStatus::Missing);
    }
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .with_context(|| format!("Failed to stat {}", path.display()))?;
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or_default();

    Ok(if age > max_age {
        AuthStatus::Stale { age }
    } else {
        AuthStatus::Fresh { age }
    })
}

pub fn age_hours(age: Duration) -> f64 {
    age.as_secs_f64() / 3600.0
}
