use fxhash::FxHashMap;

use crate::state::{Action, StateKey};

/// Action-value estimates for one state.
pub type ActionValues = FxHashMap<Action, f64>;

/// Default bound on the number of distinct states the table will hold.
pub const DEFAULT_MAX_STATES: usize = 100_000;

/// Tabular action-value store with Q-learning and SARSA update rules.
///
/// Unseen (state, action) pairs read as 0. The table is owned by exactly
/// one policy instance and is bounded: once `max_states` distinct states
/// have been recorded, updates for further new states are dropped and
/// their lookups keep reading 0, while already-recorded states continue
/// to accumulate normally. Nothing is ever evicted within the bound, so
/// estimates for known states are never lost mid-run.
pub struct ValueTable {
    states: FxHashMap<StateKey, ActionValues>,
    learning_rate: f64,
    discount_factor: f64,
    max_states: usize,
}

impl ValueTable {
    pub fn new(learning_rate: f64, discount_factor: f64) -> ValueTable {
        ValueTable::with_capacity(learning_rate, discount_factor, DEFAULT_MAX_STATES)
    }

    pub fn with_capacity(
        learning_rate: f64,
        discount_factor: f64,
        max_states: usize,
    ) -> ValueTable {
        ValueTable {
            states: FxHashMap::default(),
            learning_rate,
            discount_factor,
            max_states,
        }
    }

    /// Number of distinct states recorded so far.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Current estimate for a (state, action) pair; 0 when unseen.
    pub fn get(&self, state: StateKey, action: &Action) -> f64 {
        self.states
            .get(&state)
            .and_then(|values| values.get(action))
            .copied()
            .unwrap_or(0.0)
    }

    /// Highest-valued action recorded for a state, if any.
    ///
    /// Ties break in favor of the first map entry reaching the maximum;
    /// with the fixed hasher this is reproducible for a given insertion
    /// sequence, which the deterministic tests rely on.
    pub fn best_action(&self, state: StateKey) -> Option<Action> {
        let values = self.states.get(&state)?;
        let mut best: Option<(Action, f64)> = None;
        for (&action, &value) in values {
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((action, value)),
            }
        }
        best.map(|(action, _)| action)
    }

    /// Maximum recorded value for a state; 0 for an unseen or empty state.
    pub fn max_value(&self, state: StateKey) -> f64 {
        match self.states.get(&state) {
            Some(values) if !values.is_empty() => {
                values.values().copied().fold(f64::NEG_INFINITY, f64::max)
            }
            _ => 0.0,
        }
    }

    /// Off-policy update:
    /// `q <- (1 - a) * q + a * (r + g * max_a' Q[s'][a'])`.
    pub fn update_q_learning(
        &mut self,
        state: StateKey,
        action: Action,
        reward: f64,
        next_state: StateKey,
    ) {
        let target = reward + self.discount_factor * self.max_value(next_state);
        self.apply(state, action, target);
    }

    /// On-policy update:
    /// `q <- (1 - a) * q + a * (r + g * Q[s'][a_next])`,
    /// where `a_next` is the action the selection rule has actually chosen
    /// for the next state, not the maximizing one.
    pub fn update_sarsa(
        &mut self,
        state: StateKey,
        action: Action,
        reward: f64,
        next_state: StateKey,
        next_action: &Action,
    ) {
        let target = reward + self.discount_factor * self.get(next_state, next_action);
        self.apply(state, action, target);
    }

    fn apply(&mut self, state: StateKey, action: Action, target: f64) {
        let alpha = self.learning_rate;
        let Some(values) = self.entry(state) else {
            return;
        };
        let q = values.entry(action).or_insert(0.0);
        *q = (1.0 - alpha) * *q + alpha * target;
    }

    /// Mutable access to a state's value map, honoring the state cap.
    fn entry(&mut self, state: StateKey) -> Option<&mut ActionValues> {
        if !self.states.contains_key(&state) {
            if self.states.len() >= self.max_states {
                return None;
            }
            self.states.insert(state, ActionValues::default());
        }
        self.states.get_mut(&state)
    }
}
