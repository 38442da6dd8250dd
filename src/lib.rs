//! A learning decision policy for the 2D cutting-stock problem.
//!
//! The policy chooses, at every simulation step, which stock sheet to
//! cut, which requested item to cut from it, and at what position. Two
//! tabular learning modes (SARSA and Q-learning) share an epsilon-greedy
//! selector over a bounded action-value table; a greedy largest-first
//! heuristic is available alongside them. The [`env`] module provides
//! the matching simulation environment for driving episodes.

pub mod config;
pub mod env;
pub mod grid;
pub mod policy;
pub mod reward;
pub mod state;
pub mod value;

pub use config::{ConfigError, PolicyConfig, PolicyKind, SimConfig};
pub use env::{CutEnv, StepOutcome};
pub use grid::StockGrid;
pub use policy::CutPolicy;
pub use state::{Action, Observation, Product, StateKey};
pub use value::ValueTable;
