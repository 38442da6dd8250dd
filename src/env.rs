use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::SimConfig;
use crate::grid::StockGrid;
use crate::state::{Action, Observation, Product};

/// Result of applying one action to the environment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
}

impl StepOutcome {
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// The cutting-stock simulation: owns the stock grids and the pending
/// product requests, applies actions, and reports episode termination.
///
/// Each episode is regenerated from an explicit seed, so driving the
/// environment with `seed = episode index` reproduces runs exactly.
pub struct CutEnv {
    config: SimConfig,
    stocks: Vec<StockGrid>,
    products: Vec<Product>,
    cut_stocks: Vec<bool>,
    placed_area: usize,
    steps: usize,
}

impl CutEnv {
    pub fn new(config: SimConfig) -> CutEnv {
        let mut env = CutEnv {
            config,
            stocks: Vec::new(),
            products: Vec::new(),
            cut_stocks: Vec::new(),
            placed_area: 0,
            steps: 0,
        };
        env.reset(0);
        env
    }

    /// Regenerate stocks and product requests from the given seed and
    /// clear all per-episode state.
    pub fn reset(&mut self, seed: u64) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let cfg = &self.config;
        self.stocks = (0..cfg.num_stocks)
            .map(|_| {
                let w = rng.random_range(cfg.min_stock_size..=cfg.max_stock_size);
                let h = rng.random_range(cfg.min_stock_size..=cfg.max_stock_size);
                StockGrid::new(w, h)
            })
            .collect();
        self.products = (0..cfg.num_products)
            .map(|_| {
                let w = rng.random_range(cfg.min_product_size..=cfg.max_product_size);
                let h = rng.random_range(cfg.min_product_size..=cfg.max_product_size);
                let quantity = rng.random_range(1..=cfg.max_quantity);
                Product::new(w, h, quantity)
            })
            .collect();
        self.cut_stocks = vec![false; cfg.num_stocks];
        self.placed_area = 0;
        self.steps = 0;
    }

    /// Snapshot for the policy. Borrows the environment; the borrow ends
    /// before `step` is called.
    pub fn observe(&self) -> Observation<'_> {
        Observation {
            stocks: &self.stocks,
            products: &self.products,
        }
    }

    /// Apply one action.
    ///
    /// A feasible placement marks the rectangle occupied and decrements
    /// the matching product request. Sentinel or infeasible actions are
    /// no-ops that still consume a step. The terminal reward is the
    /// episode's filled ratio; mid-episode rewards are 0.
    pub fn step(&mut self, action: &Action) -> StepOutcome {
        self.steps += 1;
        if let Some(idx) = action.stock_idx {
            if self.is_applicable(idx, action) {
                self.stocks[idx].place(action.position, action.size);
                self.cut_stocks[idx] = true;
                self.placed_area += action.size.0 * action.size.1;
                if let Some(product) = self
                    .products
                    .iter_mut()
                    .find(|p| p.size == action.size && p.quantity > 0)
                {
                    product.quantity -= 1;
                }
            }
        }
        let terminated = self.products.iter().all(|p| p.quantity == 0);
        let truncated = !terminated && self.steps >= self.config.max_steps;
        let reward = if terminated { self.filled_ratio() } else { 0.0 };
        StepOutcome {
            reward,
            terminated,
            truncated,
        }
    }

    fn is_applicable(&self, idx: usize, action: &Action) -> bool {
        let Some(stock) = self.stocks.get(idx) else {
            return false;
        };
        stock.can_place(action.position, action.size)
            && self
                .products
                .iter()
                .any(|p| p.size == action.size && p.quantity > 0)
    }

    /// Placed item area over the total area of stocks that received at
    /// least one cut. 0 before the first successful placement.
    pub fn filled_ratio(&self) -> f64 {
        let used_area: usize = self
            .stocks
            .iter()
            .zip(&self.cut_stocks)
            .filter(|(_, &cut)| cut)
            .map(|(stock, _)| stock.area())
            .sum();
        if used_area == 0 {
            return 0.0;
        }
        self.placed_area as f64 / used_area as f64
    }

    pub fn steps(&self) -> usize {
        self.steps
    }
}
