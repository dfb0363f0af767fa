//! Legislature configuration
//!
//! Defaults match the chamber's standing rules: voting opens 48 hours after a
//! bill is submitted and stays open for 4 days. Values can come from a TOML
//! file and are then overridden by `LEGISLATURE_*` environment variables.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::announce::Channel;

/// Default debate period (48 hours).
pub const DEFAULT_DEBATE_DELAY_SECS: u64 = 48 * 60 * 60;

/// Default vote window (4 days).
pub const DEFAULT_VOTE_DURATION_SECS: u64 = 4 * 24 * 60 * 60;

/// Longest accepted debate period or vote window (ten years).
pub const MAX_PERIOD_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Channel identifiers on the chat platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub proposals: Option<String>,
    pub debate: Option<String>,
    pub voting: Option<String>,
    pub past_legislation: Option<String>,
}

impl ChannelConfig {
    /// Configured channels keyed by role.
    pub fn to_map(&self) -> HashMap<Channel, String> {
        [
            (Channel::Proposals, &self.proposals),
            (Channel::Debate, &self.debate),
            (Channel::Voting, &self.voting),
            (Channel::PastLegislation, &self.past_legislation),
        ]
        .into_iter()
        .filter_map(|(channel, id)| id.clone().map(|id| (channel, id)))
        .collect()
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegislatureConfig {
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Delay between submission and the opening of the vote.
    pub debate_delay_secs: u64,
    /// Length of the vote window.
    pub vote_duration_secs: u64,
    /// How often the daemon rescans the store for new deadlines.
    pub resync_interval_secs: u64,
    /// Accepted bill title length in characters, after trimming.
    pub min_title_len: usize,
    pub max_title_len: usize,
    /// Accepted bill text length in characters, after trimming.
    pub min_body_len: usize,
    pub max_body_len: usize,
    pub channels: ChannelConfig,
}

impl Default for LegislatureConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("database/governance.db"),
            debate_delay_secs: DEFAULT_DEBATE_DELAY_SECS,
            vote_duration_secs: DEFAULT_VOTE_DURATION_SECS,
            resync_interval_secs: 300,
            min_title_len: 5,
            max_title_len: 100,
            min_body_len: 20,
            max_body_len: 2000,
            channels: ChannelConfig::default(),
        }
    }
}

impl LegislatureConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Read a TOML file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config: Self =
            toml::from_str(&content).context("Failed to parse legislature config TOML")?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Reject periods outside `MAX_PERIOD_SECS` and inverted length bounds.
    pub fn validate(&self) -> Result<()> {
        for (name, secs) in [
            ("debate_delay_secs", self.debate_delay_secs),
            ("vote_duration_secs", self.vote_duration_secs),
        ] {
            if secs > MAX_PERIOD_SECS {
                bail!("{} = {} exceeds the maximum of {}", name, secs, MAX_PERIOD_SECS);
            }
        }
        if self.min_title_len > self.max_title_len {
            bail!(
                "min_title_len ({}) is greater than max_title_len ({})",
                self.min_title_len,
                self.max_title_len
            );
        }
        if self.min_body_len > self.max_body_len {
            bail!(
                "min_body_len ({}) is greater than max_body_len ({})",
                self.min_body_len,
                self.max_body_len
            );
        }
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("LEGISLATURE_DB_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(secs) = env_u64("LEGISLATURE_DEBATE_DELAY_SECS") {
            self.debate_delay_secs = secs;
        }
        if let Some(secs) = env_u64("LEGISLATURE_VOTE_DURATION_SECS") {
            self.vote_duration_secs = secs;
        }
        if let Some(secs) = env_u64("LEGISLATURE_RESYNC_INTERVAL_SECS") {
            self.resync_interval_secs = secs;
        }
    }

    pub fn debate_delay(&self) -> chrono::Duration {
        seconds(self.debate_delay_secs)
    }

    pub fn vote_duration(&self) -> chrono::Duration {
        seconds(self.vote_duration_secs)
    }

    pub fn resync_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.resync_interval_secs.max(1))
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.trim().parse().ok()
}

// Clamped so an unvalidated config can never overflow chrono.
fn seconds(secs: u64) -> chrono::Duration {
    chrono::Duration::seconds(secs.min(MAX_PERIOD_SECS) as i64)
}
