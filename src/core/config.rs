use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Top-level configuration snapshot for the queue engine. Read-only once
/// loaded; every policy knob the admission and promotion paths consult lives
/// here.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub destinations: DestinationConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub availability: AvailabilityConfig,
    #[serde(default)]
    pub redirect: RedirectConfig,
    #[serde(default)]
    pub soft_reject: SoftRejectConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub messages: MessageConfig,
    pub tiers: Vec<TierConfig>,
}

/// Named backend destinations the engine routes between.
#[derive(Debug, Clone, Deserialize)]
pub struct DestinationConfig {
    /// The real target backend sessions ultimately want to reach.
    pub primary: String,
    /// The waiting-room backend queued sessions are parked on.
    pub holding: String,
    /// When set, only transitions from this source toward the primary are
    /// gated; sessions moving between other destinations pass through.
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Queue every arriving session even when slots are free.
    #[serde(default)]
    pub always_queue: bool,
    /// Per-cycle promotion cap, applied per tier.
    #[serde(default = "default_cycle_cap")]
    pub max_promotions_per_cycle: usize,
    /// Permission node that skips the queue entirely.
    #[serde(default = "default_bypass_permission")]
    pub bypass_permission: String,
    /// Record the primary as the intended destination regardless of what the
    /// session originally requested.
    #[serde(default)]
    pub force_primary_target: bool,
    /// Stop promoting while the primary destination is not live.
    #[serde(default = "default_true")]
    pub pause_when_primary_down: bool,
    /// Seconds between promotion cycles when driven by the scheduler.
    #[serde(default = "default_cycle_seconds")]
    pub cycle_seconds: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            always_queue: false,
            max_promotions_per_cycle: default_cycle_cap(),
            bypass_permission: default_bypass_permission(),
            force_primary_target: false,
            pause_when_primary_down: default_true(),
            cycle_seconds: default_cycle_seconds(),
        }
    }
}

/// Pre-authentication username filtering.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_username_regex")]
    pub username_regex: String,
    /// Rejection text; `%regex%` is replaced with the configured pattern.
    #[serde(default = "default_regex_message")]
    pub message: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            username_regex: default_username_regex(),
            message: default_regex_message(),
        }
    }
}

impl FilterConfig {
    /// Compile the pattern anchored to the full username.
    pub fn compile(&self) -> Result<Regex> {
        Regex::new(&format!("^(?:{})$", self.username_regex))
            .with_context(|| format!("invalid filter.username_regex {:?}", self.username_regex))
    }
}

/// Refuse new connections while required destinations are down.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityConfig {
    #[serde(default)]
    pub kick_when_down: bool,
    /// Destinations that must all be live before a gated connection passes.
    #[serde(default)]
    pub require_live: Vec<String>,
}

/// Divert sessions kicked off the primary back into the queue instead of
/// dropping them.
#[derive(Debug, Clone, Deserialize)]
pub struct RedirectConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Case-insensitive substrings of the kick reason that trigger the
    /// redirect.
    #[serde(default)]
    pub trigger_words: Vec<String>,
    #[serde(default = "default_redirect_message")]
    pub message: String,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            trigger_words: Vec::new(),
            message: default_redirect_message(),
        }
    }
}

/// How a soft-rejected identity is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoftRejectMode {
    /// Disconnect at login, bypassing the queue.
    Kick,
    /// Perpetually re-queue; the session never clears the queue.
    Loop,
    /// Re-queue with the configured probability per promotion attempt.
    Percent,
}

impl FromStr for SoftRejectMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kick" => Ok(Self::Kick),
            "loop" => Ok(Self::Loop),
            "percent" => Ok(Self::Percent),
            other => bail!("invalid soft_reject.mode {}", other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SoftRejectConfig {
    #[serde(default = "default_soft_reject_mode")]
    pub mode: SoftRejectMode,
    /// Re-queue probability for `percent` mode: a uniform draw in [0,100)
    /// that is >= this value re-queues the session.
    #[serde(default = "default_percentage")]
    pub percentage: u8,
    #[serde(default = "default_soft_reject_message")]
    pub message: String,
}

impl Default for SoftRejectConfig {
    fn default() -> Self {
        Self {
            mode: default_soft_reject_mode(),
            percentage: default_percentage(),
            message: default_soft_reject_message(),
        }
    }
}

/// Repair sessions stranded on the holding destination without a queue
/// entry, e.g. after a restart.
#[derive(Debug, Clone, Deserialize)]
pub struct RecoveryConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_recovery_message")]
    pub message: String,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            message: default_recovery_message(),
        }
    }
}

/// Cosmetic side-channel signal sent toward the holding destination after
/// each tier's promotion pass.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub sound: bool,
    #[serde(default = "default_notify_channel")]
    pub channel: String,
    #[serde(default = "default_notify_tag")]
    pub tag: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            sound: false,
            channel: default_notify_channel(),
            tag: default_notify_tag(),
        }
    }
}

/// User-visible message texts. Every externally visible failure is one of
/// these, by policy.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageConfig {
    #[serde(default = "default_server_full_message")]
    pub server_full: String,
    #[serde(default = "default_joining_message")]
    pub joining: String,
    #[serde(default = "default_server_down_kick_message")]
    pub server_down_kick: String,
    /// When set, replaces every kick message unconditionally.
    #[serde(default)]
    pub kick_override: Option<String>,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            server_full: default_server_full_message(),
            joining: default_joining_message(),
            server_down_kick: default_server_down_kick_message(),
            kick_override: None,
        }
    }
}

/// One priority tier, highest priority first; the last entry must omit
/// `permission` and acts as the catch-all.
#[derive(Debug, Clone, Deserialize)]
pub struct TierConfig {
    pub name: String,
    #[serde(default)]
    pub permission: Option<String>,
    pub reserved_slots: usize,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub footer: String,
}

fn default_true() -> bool {
    true
}

fn default_cycle_cap() -> usize {
    5
}

fn default_cycle_seconds() -> u64 {
    2
}

fn default_bypass_permission() -> String {
    "turnstile.bypass".to_string()
}

fn default_username_regex() -> String {
    "[a-zA-Z0-9_]{2,16}".to_string()
}

fn default_regex_message() -> String {
    "Your username does not match the allowed format (%regex%).".to_string()
}

fn default_redirect_message() -> String {
    "The target server went down. You have been moved back into the queue.".to_string()
}

fn default_soft_reject_mode() -> SoftRejectMode {
    SoftRejectMode::Kick
}

fn default_percentage() -> u8 {
    100
}

fn default_soft_reject_message() -> String {
    "The server is full. You have been placed back in the queue.".to_string()
}

fn default_recovery_message() -> String {
    "You were re-added to the queue after a service restart.".to_string()
}

fn default_notify_channel() -> String {
    "turnstile:queue".to_string()
}

fn default_notify_tag() -> String {
    "xp".to_string()
}

fn default_server_full_message() -> String {
    "The server is full. You have been placed in the queue.".to_string()
}

fn default_joining_message() -> String {
    "You are being connected to the target server.".to_string()
}

fn default_server_down_kick_message() -> String {
    "The server is currently unavailable. Please try again later.".to_string()
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let data = fs::read_to_string(path_ref)
            .with_context(|| format!("unable to read config {}", path_ref.display()))?;
        let config: Self = toml::from_str(&data)
            .with_context(|| format!("invalid TOML config {}", path_ref.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the queue engine assumes away: contradictory
    /// tier layouts, an uncompilable filter, out-of-range percentages.
    pub fn validate(&self) -> Result<()> {
        if self.tiers.is_empty() {
            bail!("tiers must not be empty");
        }
        for (idx, tier) in self.tiers.iter().enumerate() {
            if tier.permission.is_none() && idx + 1 != self.tiers.len() {
                bail!(
                    "tier {} has no permission node but is not last; it would shadow later tiers",
                    tier.name
                );
            }
            if self.tiers[idx + 1..].iter().any(|t| t.name == tier.name) {
                bail!("duplicate tier name {}", tier.name);
            }
        }
        match self.tiers.last() {
            Some(last) if last.permission.is_none() => {}
            _ => bail!("the last tier must be the catch-all tier without a permission node"),
        }
        if self.policy.max_promotions_per_cycle == 0 {
            bail!("policy.max_promotions_per_cycle must be at least 1");
        }
        if self.policy.cycle_seconds == 0 {
            bail!("policy.cycle_seconds must be at least 1");
        }
        if self.soft_reject.percentage > 100 {
            bail!(
                "soft_reject.percentage {} out of range 0..=100",
                self.soft_reject.percentage
            );
        }
        if self.filter.enabled {
            self.filter.compile()?;
        }
        if self.destinations.primary == self.destinations.holding {
            bail!("destinations.primary and destinations.holding must differ");
        }
        Ok(())
    }
}
