use std::io::BufRead;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use quire_core::{ContentItem, SiteConfig, SyncEvent};

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(
    author,
    version,
    about = "Mirror a local article corpus into a Halo blog"
)]
#[command(after_help = "Examples:
  quire publish --op create articles.jsonl
  quire publish --op delete removed.jsonl
  quire adopt > corpus.jsonl

Settings are read from ~/.config/quire/site.toml and can be overridden
with flags or QUIRE_* environment variables.")]
pub struct Config {
    /// Base URL of the Halo blog
    #[arg(long, env = "QUIRE_URL")]
    pub url: Option<String>,

    /// Admin username
    #[arg(long, env = "QUIRE_USERNAME")]
    pub username: Option<String>,

    /// Admin password
    #[arg(long, env = "QUIRE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Front matter format of the local articles: yaml (default), json or toml
    #[arg(long, env = "QUIRE_META_FORMAT")]
    pub meta_format: Option<String>,

    /// Custom path to site.toml configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum number of tasks of one batch running at the same time
    #[arg(long, env = "QUIRE_MAX_IN_FLIGHT", value_name = "N")]
    pub max_in_flight: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply one batch of articles to the blog
    #[command(after_help = "Input is JSON Lines, one article per line:
  {\"name\": \"Hello\", \"body\": \"# Hello\", \"tags\": [\"rust\"], \"categories\": [{\"name\": \"notes\"}]}

Use '-' to read from stdin.")]
    Publish {
        /// Operation to apply to every article
        #[arg(long, value_enum, default_value = "create")]
        op: PublishOp,

        /// JSON Lines file with the articles
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
    /// Print every published Markdown post as JSON Lines
    Adopt,
}

/// Operation applied by the publish command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PublishOp {
    Create,
    Update,
    Delete,
}

impl PublishOp {
    pub fn into_event(self, items: Vec<ContentItem>) -> SyncEvent {
        match self {
            PublishOp::Create => SyncEvent::ArticleAdded(items),
            PublishOp::Update => SyncEvent::ArticleUpdated(items),
            PublishOp::Delete => SyncEvent::ArticleDeleted(items),
        }
    }
}

impl Config {
    /// Merges flags and environment over the values from `site.toml`.
    pub fn site_config(&self, file: Option<SiteConfig>) -> anyhow::Result<SiteConfig> {
        let (file_url, file_username, file_password, file_meta) = match file {
            Some(site) => (
                Some(site.url),
                Some(site.username),
                Some(site.password),
                site.meta_format,
            ),
            None => (None, None, None, None),
        };

        let site = SiteConfig {
            url: self
                .url
                .clone()
                .or(file_url)
                .context("No site URL configured. Set --url, QUIRE_URL or url in site.toml")?,
            username: self
                .username
                .clone()
                .or(file_username)
                .context("No username configured. Set --username or QUIRE_USERNAME")?,
            password: self
                .password
                .clone()
                .or(file_password)
                .context("No password configured. Set --password or QUIRE_PASSWORD")?,
            meta_format: self.meta_format.clone().or(file_meta),
        };

        site.validate()?;
        Ok(site)
    }
}

/// Reads articles from JSON Lines, skipping blank lines.
pub fn read_items<R: BufRead>(reader: R) -> anyhow::Result<Vec<ContentItem>> {
    let mut items = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }
        let item: ContentItem = serde_json::from_str(&line)
            .with_context(|| format!("Invalid article on line {}", index + 1))?;
        items.push(item);
    }
    Ok(items)
}
