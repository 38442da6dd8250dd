use std::env;
use std::error::Error;
use std::fmt;

use serde::Deserialize;

/// Which decision strategy the policy runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// On-policy learning (POLICY_ID = 1).
    Sarsa,
    /// Off-policy learning (POLICY_ID = 2).
    QLearning,
    /// Largest-item-first placement, no learning. Selected from the CLI
    /// rather than POLICY_ID.
    Greedy,
}

impl PolicyKind {
    pub fn is_learning(&self) -> bool {
        !matches!(self, PolicyKind::Greedy)
    }
}

/// Configuration error raised at policy construction. Always fatal;
/// nothing here silently falls back to a default.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    BadPolicyId(String),
    BadValue { name: &'static str, value: String },
    OutOfRange { name: &'static str, value: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::BadPolicyId(value) => {
                write!(f, "POLICY_ID must be 1 or 2, got {:?}", value)
            }
            ConfigError::BadValue { name, value } => {
                write!(f, "{} is not a number: {:?}", name, value)
            }
            ConfigError::OutOfRange { name, value } => {
                write!(f, "{} out of range: {}", name, value)
            }
        }
    }
}

impl Error for ConfigError {}

/// Learning parameters, read once at policy construction.
///
/// Mirrors the environment-variable surface: `POLICY_ID`,
/// `LEARNING_RATE` (alpha), `DISCOUNT_FACTOR` (gamma) and
/// `EXPLORATION_RATE` (epsilon). Unset variables take the documented
/// defaults; set-but-invalid values are construction failures.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyConfig {
    pub kind: PolicyKind,
    pub learning_rate: f64,
    pub discount_factor: f64,
    pub exploration_rate: f64,
}

impl PolicyConfig {
    pub fn new(
        kind: PolicyKind,
        learning_rate: f64,
        discount_factor: f64,
        exploration_rate: f64,
    ) -> Result<PolicyConfig, ConfigError> {
        if !(learning_rate > 0.0 && learning_rate <= 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "LEARNING_RATE",
                value: learning_rate,
            });
        }
        if !(0.0..=1.0).contains(&discount_factor) {
            return Err(ConfigError::OutOfRange {
                name: "DISCOUNT_FACTOR",
                value: discount_factor,
            });
        }
        if !(0.0..=1.0).contains(&exploration_rate) {
            return Err(ConfigError::OutOfRange {
                name: "EXPLORATION_RATE",
                value: exploration_rate,
            });
        }
        Ok(PolicyConfig {
            kind,
            learning_rate,
            discount_factor,
            exploration_rate,
        })
    }

    /// Read the policy configuration from process environment variables.
    pub fn from_env() -> Result<PolicyConfig, ConfigError> {
        PolicyConfig::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](PolicyConfig::from_env) with an injectable
    /// variable source, so tests never touch process state.
    pub fn from_lookup<F>(lookup: F) -> Result<PolicyConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = match lookup("POLICY_ID").as_deref() {
            None | Some("1") => PolicyKind::Sarsa,
            Some("2") => PolicyKind::QLearning,
            Some(other) => return Err(ConfigError::BadPolicyId(other.to_string())),
        };
        let learning_rate = parse_rate(&lookup, "LEARNING_RATE", 0.1)?;
        let discount_factor = parse_rate(&lookup, "DISCOUNT_FACTOR", 0.9)?;
        let exploration_rate = parse_rate(&lookup, "EXPLORATION_RATE", 0.2)?;
        PolicyConfig::new(kind, learning_rate, discount_factor, exploration_rate)
    }
}

fn parse_rate<F>(lookup: &F, name: &'static str, default: f64) -> Result<f64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::BadValue {
            name,
            value: raw.clone(),
        }),
    }
}

/// Simulation parameters, read from a TOML configuration file.
#[derive(Deserialize, Debug, Clone)]
pub struct SimConfig {
    /// Number of stock sheets per episode.
    pub num_stocks: usize,
    /// Inclusive bounds on generated stock side lengths.
    pub min_stock_size: usize,
    pub max_stock_size: usize,
    /// Number of distinct product requests per episode.
    pub num_products: usize,
    /// Inclusive bounds on generated product side lengths.
    pub min_product_size: usize,
    pub max_product_size: usize,
    /// Inclusive upper bound on a product's requested quantity.
    pub max_quantity: usize,
    /// Step budget before an episode is truncated.
    pub max_steps: usize,
}

impl SimConfig {
    /// Small deterministic setup used across the test modules.
    #[cfg(test)]
    pub fn for_tests() -> SimConfig {
        SimConfig {
            num_stocks: 2,
            min_stock_size: 4,
            max_stock_size: 6,
            num_products: 3,
            min_product_size: 1,
            max_product_size: 3,
            max_quantity: 2,
            max_steps: 50,
        }
    }
}
