//! # Pool Policy
//!
//! Settings a pool applies to every channel it opens: how many shares per minute a miner
//! should find, how often shares are acknowledged, the tag written in coinbases and where the
//! block reward goes.
//!
//! ```toml
//! expected_shares_per_minute = 6.0
//! share_batch_size = 10
//! pool_tag_string = "Stratum V2 SRI Pool"
//! pool_payout_script_pubkey = "0014ebe1b7dcc293ccaa0ee743a86f89df8258c208fc"
//! # optional, extended channels allow version rolling unless set to false
//! version_rolling_allowed = true
//! ```
use std::{fmt, path::Path};

use bitcoin::TxOut;
use ext_config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;
use tracing::debug;

use crate::{
    server::jobs::factory::{JobFactory, MAX_SCRIPT_SIG_LEN},
    txout::TxOutput,
};

#[derive(Debug)]
pub enum PolicyError {
    Config(ConfigError),
    InvalidSharesPerMinute(f32),
    InvalidShareBatchSize,
    /// The coinbase scriptSig would exceed 100 bytes with this tag.
    PoolTagTooLong(usize),
    InvalidPayoutScript,
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyError::Config(e) => write!(f, "Failed to load pool policy: {}", e),
            PolicyError::InvalidSharesPerMinute(v) => {
                write!(f, "Expected shares per minute must be positive, got {}", v)
            }
            PolicyError::InvalidShareBatchSize => write!(f, "Share batch size must be positive"),
            PolicyError::PoolTagTooLong(len) => {
                write!(f, "Pool tag of {} bytes does not fit in the coinbase", len)
            }
            PolicyError::InvalidPayoutScript => {
                write!(f, "Pool payout script_pubkey must be non-empty hex")
            }
        }
    }
}

impl std::error::Error for PolicyError {}

impl From<ConfigError> for PolicyError {
    fn from(e: ConfigError) -> Self {
        PolicyError::Config(e)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PoolPolicy {
    expected_shares_per_minute: f32,
    share_batch_size: usize,
    #[serde(default)]
    pool_tag_string: String,
    pool_payout_script_pubkey: String,
    #[serde(default = "allow_version_rolling")]
    version_rolling_allowed: bool,
}

fn allow_version_rolling() -> bool {
    true
}

impl PoolPolicy {
    pub fn new(
        expected_shares_per_minute: f32,
        share_batch_size: usize,
        pool_tag_string: String,
        pool_payout_script_pubkey: String,
    ) -> Result<Self, PolicyError> {
        let policy = Self {
            expected_shares_per_minute,
            share_batch_size,
            pool_tag_string,
            pool_payout_script_pubkey,
            version_rolling_allowed: allow_version_rolling(),
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Loads a TOML policy file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PolicyError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Toml))
            .build()?;
        let policy = settings.try_deserialize::<PoolPolicy>()?;
        policy.validate()?;
        debug!("Loaded pool policy from {}", path.as_ref().display());
        Ok(policy)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self, PolicyError> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        let policy = settings.try_deserialize::<PoolPolicy>()?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if !(self.expected_shares_per_minute.is_finite() && self.expected_shares_per_minute > 0.0)
        {
            return Err(PolicyError::InvalidSharesPerMinute(
                self.expected_shares_per_minute,
            ));
        }
        if self.share_batch_size == 0 {
            return Err(PolicyError::InvalidShareBatchSize);
        }
        if JobFactory::new(true, self.pool_tag()).max_script_sig_len() > MAX_SCRIPT_SIG_LEN {
            return Err(PolicyError::PoolTagTooLong(self.pool_tag_string.len()));
        }
        self.payout_script()?;
        Ok(())
    }

    pub fn expected_shares_per_minute(&self) -> f32 {
        self.expected_shares_per_minute
    }

    pub fn share_batch_size(&self) -> usize {
        self.share_batch_size
    }

    /// Whether jobs of extended channels opened under this policy allow version rolling.
    pub fn version_rolling_allowed(&self) -> bool {
        self.version_rolling_allowed
    }

    pub fn with_version_rolling_allowed(mut self, version_rolling_allowed: bool) -> Self {
        self.version_rolling_allowed = version_rolling_allowed;
        self
    }

    /// The tag written between `/` and `//` in the coinbase, `None` if empty.
    pub fn pool_tag(&self) -> Option<String> {
        if self.pool_tag_string.is_empty() {
            None
        } else {
            Some(self.pool_tag_string.clone())
        }
    }

    pub fn payout_script(&self) -> Result<Vec<u8>, PolicyError> {
        match hex::decode(&self.pool_payout_script_pubkey) {
            Ok(script) if !script.is_empty() => Ok(script),
            _ => Err(PolicyError::InvalidPayoutScript),
        }
    }

    /// A single output paying `value` sats to the pool.
    pub fn coinbase_reward_outputs(&self, value: u64) -> Result<Vec<TxOut>, PolicyError> {
        Ok(vec![TxOutput::new(value, self.payout_script()?).to_txout()])
    }
}
