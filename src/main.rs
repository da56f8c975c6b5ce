mod archive;
mod browser;
mod error;
mod parser;
mod render;
mod settings;
mod style;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use archive::{Archive, Post, SOURCE_EXPORT};
use browser::session::{self, AuthStatus, SessionState};
use browser::FetchOptions;
use error::ArchiveError;
use parser::filter::NoiseFilter;
use settings::Settings;

const SAMPLE_POSTS: usize = 5;
const SAMPLE_CHARS: usize = 150;

#[derive(Parser)]
#[command(
    name = "fb_archiver",
    about = "Archive one person's Facebook posts as JSON + a Markdown style digest"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in interactively and save the browser session
    Auth,
    /// Scrape posts from a profile page with the saved session
    Fetch {
        /// Profile URL, e.g. https://www.facebook.com/some.profile
        #[arg(long)]
        url: String,
        /// Number of scroll steps used to load older posts
        #[arg(long, default_value = "10")]
        scrolls: u32,
        /// Show the browser window
        #[arg(long)]
        show: bool,
        /// Profile owner's display name (default: user_name setting)
        #[arg(long)]
        name: Option<String>,
    },
    /// Check whether a saved session exists and how old it is
    Status,
    /// Extract posts from a downloaded Facebook export (HTML)
    Parse {
        /// Posts HTML file (default: export_html setting)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Profile owner's display name (default: user_name setting)
        #[arg(long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Auth => {
            browser::setup_auth(&settings).await?;
            println!("Session saved to {}", settings.paths().state_file.display());
            Ok(())
        }
        Commands::Status => {
            let path = settings.paths().state_file;
            match session::check(&path, settings.auth_max_age())? {
                AuthStatus::Missing => println!("Not authenticated. Run 'auth' first."),
                AuthStatus::Fresh { age } => println!(
                    "Authenticated (session saved {:.1}h ago).",
                    session::age_hours(age)
                ),
                AuthStatus::Stale { age } => println!(
                    "Authenticated, but the session is {:.1}h old. Re-running 'auth' is recommended.",
                    session::age_hours(age)
                ),
            }
            Ok(())
        }
        Commands::Fetch { url, scrolls, show, name } => {
            let state = load_session(&settings)?;
            println!("Fetching posts from {} ({} scrolls)...", url, scrolls);
            let opts = FetchOptions {
                url,
                scrolls,
                show_browser: show,
            };
            let posts = browser::fetch_posts(&settings, &state, &opts).await?;
            println!("Fetched {} posts.", posts.len());
            save(&settings, name.as_deref(), None, posts)
        }
        Commands::Parse { input, name } => {
            let input = input.unwrap_or_else(|| settings.export_html.clone());
            if !input.exists() {
                return Err(ArchiveError::InputMissing(input).into());
            }
            println!("Reading {}", input.display());
            let html = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;

            let filter = NoiseFilter::new(settings.export_actor_name.as_deref());
            let posts = parser::parse_export(&html, &filter);
            println!("Extracted {} text posts.", posts.len());
            print_samples(&posts);
            save(&settings, name.as_deref(), Some(SOURCE_EXPORT), posts)
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Require a saved session; warn when it is older than the configured limit.
fn load_session(settings: &Settings) -> Result<SessionState> {
    let path = settings.paths().state_file;
    match session::check(&path, settings.auth_max_age())? {
        AuthStatus::Missing => return Err(ArchiveError::NotAuthenticated(path).into()),
        AuthStatus::Stale { age } => warn!(
            "Session state is {:.0}h old. Re-running 'auth' is recommended.",
            session::age_hours(age)
        ),
        AuthStatus::Fresh { .. } => {}
    }
    SessionState::load(&path)
}

fn save(settings: &Settings, name: Option<&str>, source: Option<&str>, posts: Vec<Post>) -> Result<()> {
    if posts.is_empty() {
        println!("No posts to save.");
        return Ok(());
    }

    let notes = match &settings.style_notes {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read style notes {}", path.display()))?,
        ),
        None => None,
    };

    let user_name = name.unwrap_or(&settings.user_name);
    let archive = Archive::build(user_name, source, posts);
    let paths = settings.paths();
    archive::save(&paths, &archive, notes.as_deref())?;
    info!(posts = archive.total_posts, "Archive saved");

    println!("JSON:     {}", paths.posts_json.display());
    println!("Markdown: {}", paths.digest_md.display());
    println!("Upload the Markdown file to your document-analysis tool.");
    Ok(())
}

fn print_samples(posts: &[Post]) {
    if posts.is_empty() {
        return;
    }
    println!("\nSample posts:");
    for post in posts.iter().take(SAMPLE_POSTS) {
        println!("\n  [{}]", post.date.as_deref().unwrap_or("?"));
        println!("  {}", truncate(&post.text, SAMPLE_CHARS));
    }
    println!();
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
