//! Configuration for a Catena instance.
//!
//! Every section has defaults except the chain id, which must be supplied.
//! [`CatenaConfig::from_env`] reads `CATENA_*` variables:
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `CATENA_CHAIN_ID` | `writer.chain_id` | required |
//! | `CATENA_CHUNK_CAPACITY` | `writer.chunk_capacity` | 64 |
//! | `CATENA_CACHE_CAPACITY` | `verifier.cache_capacity` | 10000 |
//! | `CATENA_CLOCK_SKEW_MS` | `aggregator.clock_skew_ms` (non-negative) | 120000 |
//! | `CATENA_CONCURRENCY` | `aggregator.concurrency` | 8 |
//! | `CATENA_MAX_CHUNKS` | `aggregator.max_chunks` | 4096 |
//! | `CATENA_MAX_BLOB_SIZE` | `store.max_blob_size` | 8 MiB |

use std::str::FromStr;

use catena_aggregate::AggregatorConfig;
use catena_log::WriterConfig;
use catena_store::StoreConfig;
use catena_verify::VerifierConfig;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required variable {0}")]
    Missing(&'static str),

    /// A variable is set but does not parse.
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// All tunables, grouped by component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatenaConfig {
    pub writer: WriterConfig,
    pub verifier: VerifierConfig,
    pub aggregator: AggregatorConfig,
    pub store: StoreConfig,
}

impl CatenaConfig {
    /// Defaults for everything, on `chain_id`.
    pub fn new(chain_id: u64) -> Self {
        Self {
            writer: WriterConfig::new(chain_id),
            verifier: VerifierConfig::default(),
            aggregator: AggregatorConfig::default(),
            store: StoreConfig::default(),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.writer.chain_id
    }

    /// Read from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let chain_id = parse(&lookup, "CATENA_CHAIN_ID")?.ok_or(ConfigError::Missing("CATENA_CHAIN_ID"))?;
        let mut config = Self::new(chain_id);

        if let Some(v) = parse(&lookup, "CATENA_CHUNK_CAPACITY")? {
            config.writer.chunk_capacity = v;
        }
        if let Some(v) = parse(&lookup, "CATENA_CACHE_CAPACITY")? {
            config.verifier.cache_capacity = v;
        }
        if let Some(v) = parse::<i64, _>(&lookup, "CATENA_CLOCK_SKEW_MS")? {
            if v < 0 {
                return Err(ConfigError::Invalid {
                    var: "CATENA_CLOCK_SKEW_MS",
                    value: v.to_string(),
                });
            }
            config.aggregator.clock_skew_ms = v;
        }
        if let Some(v) = parse(&lookup, "CATENA_CONCURRENCY")? {
            config.aggregator.concurrency = v;
        }
        if let Some(v) = parse(&lookup, "CATENA_MAX_CHUNKS")? {
            config.aggregator.max_chunks = v;
        }
        if let Some(v) = parse(&lookup, "CATENA_MAX_BLOB_SIZE")? {
            config.store.max_blob_size = v;
        }

        if config.writer.chunk_capacity == 0 {
            return Err(ConfigError::Invalid {
                var: "CATENA_CHUNK_CAPACITY",
                value: "0".into(),
            });
        }
        Ok(config)
    }
}

fn parse<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
