//! Configuration readable from a config file.
//!
//! Rampart reads its tuning parameters from a TOML file. This module contains a struct
//! [`Rampart`] which holds such a configuration. Every field has a default, so an empty file is
//! a valid configuration:
//!
//! ```toml
//! verbosity = "Quiet"
//!
//! [cookie]
//! secret_max_age_secs = 120
//! secret_latency_secs = 5
//!
//! [rate_limiter]
//! element_timeout_ms = 1000
//! token_max_ns = 250000000
//! initiation_cost_ns = 50000000
//! table_size = 8192
//! max_entries_multiplier = 8
//! ipv6_prefix_bytes = 8
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};

use crate::constants::{
    ELEMENT_TIMEOUT, INITIATION_COST, IPV6_PREFIX_BYTES, MAX_ENTRIES_MULTIPLIER, NS_PER_MS,
    NS_PER_SEC, SECRET_LATENCY, SECRET_MAX_AGE, TABLE_SIZE, TOKEN_MAX,
};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rampart {
    /// log verbosity
    ///
    /// Overridden by the log level flags on the command line.
    #[serde(default)]
    pub verbosity: Verbosity,

    /// timing of the cookie mechanism
    #[serde(default)]
    pub cookie: CookieConfig,

    /// sizing and token accounting of the rate limiter
    #[serde(default)]
    pub rate_limiter: RateLimiterConfig,

    /// path to the file which provided this configuration
    ///
    /// This item is of course not read from the TOML but is added by the algorithm that parses
    /// the config file.
    #[serde(skip)]
    pub config_file_path: PathBuf,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verbosity {
    #[default]
    Quiet,
    Verbose,
}

impl Verbosity {
    pub fn log_level(&self) -> log::LevelFilter {
        match self {
            Self::Quiet => log::LevelFilter::Warn,
            Self::Verbose => log::LevelFilter::Debug,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CookieConfig {
    /// seconds after which the responder rotates its cookie secret
    pub secret_max_age_secs: u64,

    /// seconds by which the initiator stops using a cookie before the responder may rotate
    pub secret_latency_secs: u64,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            secret_max_age_secs: SECRET_MAX_AGE / NS_PER_SEC,
            secret_latency_secs: SECRET_LATENCY / NS_PER_SEC,
        }
    }
}

impl CookieConfig {
    pub fn secret_max_age_ns(&self) -> u64 {
        self.secret_max_age_secs.saturating_mul(NS_PER_SEC)
    }

    pub fn secret_latency_ns(&self) -> u64 {
        self.secret_latency_secs.saturating_mul(NS_PER_SEC)
    }

    /// How long the initiator may use a cookie after receiving it
    pub fn cookie_lifetime_ns(&self) -> u64 {
        self.secret_max_age_ns()
            .saturating_sub(self.secret_latency_ns())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.secret_max_age_secs > 0,
            "cookie.secret_max_age_secs must be positive"
        );
        ensure!(
            self.secret_latency_secs < self.secret_max_age_secs,
            "cookie.secret_latency_secs ({}) must be smaller than cookie.secret_max_age_secs ({})",
            self.secret_latency_secs,
            self.secret_max_age_secs
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateLimiterConfig {
    /// milliseconds of inactivity after which an address is forgotten
    pub element_timeout_ms: u64,

    /// maximum budget an address can accrue, in tokens (one token per nanosecond)
    pub token_max_ns: u64,

    /// tokens spent per admitted initiation
    pub initiation_cost_ns: u64,

    /// number of hash buckets
    pub table_size: usize,

    /// the table never holds more than `table_size * max_entries_multiplier` addresses
    pub max_entries_multiplier: usize,

    /// number of leading IPv6 address bytes that identify a source
    ///
    /// 8 rate limits each /64 as a whole, 16 rate limits every address separately.
    pub ipv6_prefix_bytes: usize,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            element_timeout_ms: ELEMENT_TIMEOUT / NS_PER_MS,
            token_max_ns: TOKEN_MAX,
            initiation_cost_ns: INITIATION_COST,
            table_size: TABLE_SIZE,
            max_entries_multiplier: MAX_ENTRIES_MULTIPLIER,
            ipv6_prefix_bytes: IPV6_PREFIX_BYTES,
        }
    }
}

impl RateLimiterConfig {
    pub fn element_timeout_ns(&self) -> u64 {
        self.element_timeout_ms.saturating_mul(NS_PER_MS)
    }

    /// Hard cap on the number of entries in the table
    pub fn max_entries(&self) -> usize {
        self.table_size.saturating_mul(self.max_entries_multiplier)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.initiation_cost_ns > 0,
            "rate_limiter.initiation_cost_ns must be positive"
        );
        ensure!(
            self.token_max_ns >= self.initiation_cost_ns,
            "rate_limiter.token_max_ns ({}) must be at least rate_limiter.initiation_cost_ns ({})",
            self.token_max_ns,
            self.initiation_cost_ns
        );
        // An idle entry is only forgotten once its bucket has refilled completely; otherwise
        // garbage collection would hand out fresh budget early
        ensure!(
            self.element_timeout_ns() >= self.token_max_ns,
            "rate_limiter.element_timeout_ms ({}) must cover rate_limiter.token_max_ns ({})",
            self.element_timeout_ms,
            self.token_max_ns
        );
        ensure!(self.table_size > 0, "rate_limiter.table_size must be positive");
        ensure!(
            self.max_entries_multiplier > 0,
            "rate_limiter.max_entries_multiplier must be positive"
        );
        ensure!(
            u32::try_from(self.max_entries()).is_ok(),
            "rate_limiter.table_size * rate_limiter.max_entries_multiplier must fit into 32 bits"
        );
        ensure!(
            (1..=16).contains(&self.ipv6_prefix_bytes),
            "rate_limiter.ipv6_prefix_bytes ({}) must be between 1 and 16",
            self.ipv6_prefix_bytes
        );
        Ok(())
    }
}

impl Rampart {
    /// load configuration from a TOML file
    ///
    /// NOTE: no validation is conducted; call [Self::validate] to check the values.
    pub fn load<P: AsRef<Path>>(p: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(&p)
            .with_context(|| format!("could not read config file {:?}", p.as_ref()))?;
        let mut config: Self = toml::from_str(&contents)?;

        // add path to "self"
        config.config_file_path = p.as_ref().to_owned();

        Ok(config)
    }

    /// Write a config to a file
    pub fn store<P: AsRef<Path>>(&self, p: P) -> anyhow::Result<()> {
        let serialized_config = toml::to_string_pretty(&self)?;
        fs::write(&p, serialized_config)
            .with_context(|| format!("could not write config file {:?}", p.as_ref()))?;
        Ok(())
    }

    /// Validate a configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.cookie.validate()?;
        self.rate_limiter.validate()?;
        Ok(())
    }
}
