use std::fmt;
use std::hash::{Hash, Hasher};

use fxhash::FxHasher;

use crate::grid::StockGrid;

/// A requested item size with its remaining quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub size: (usize, usize),
    pub quantity: usize,
}

impl Product {
    pub fn new(width: usize, height: usize, quantity: usize) -> Product {
        Product {
            size: (width, height),
            quantity,
        }
    }

    pub fn area(&self) -> usize {
        self.size.0 * self.size.1
    }
}

/// Per-step snapshot of the environment: all stocks plus all pending
/// product requests, in their original order. Borrowed for the duration
/// of one decision call only.
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    pub stocks: &'a [StockGrid],
    pub products: &'a [Product],
}

/// One cutting decision: which stock, which item size, and where.
///
/// `stock_idx` of `None` is the sentinel for "no valid placement found";
/// the environment treats it as a no-op step. The derived `Eq`/`Hash`
/// make the action its own value-table key: two actions with identical
/// fields always index the same table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Action {
    pub stock_idx: Option<usize>,
    pub size: (usize, usize),
    pub position: (usize, usize),
}

impl Action {
    pub fn place(stock_idx: usize, size: (usize, usize), position: (usize, usize)) -> Action {
        Action {
            stock_idx: Some(stock_idx),
            size,
            position,
        }
    }

    /// The "no valid action found" sentinel.
    pub fn sentinel() -> Action {
        Action {
            stock_idx: None,
            size: (0, 0),
            position: (0, 0),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.stock_idx.is_none()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.stock_idx {
            Some(idx) => write!(
                f,
                "stock {} item {}x{} at ({}, {})",
                idx, self.size.0, self.size.1, self.position.0, self.position.1
            ),
            None => write!(f, "no placement"),
        }
    }
}

/// Deterministic identity of an observation, used to index the value
/// table.
///
/// The key is a 64-bit fingerprint over every stock's dimensions and raw
/// cell states plus every product's size and quantity, folded through an
/// `FxHasher` in order. Identical observations always map to the same
/// key; the encoding is order-sensitive and performs no canonicalization,
/// so reordered stocks or products key as distinct states. Distinct
/// observations collide only with fingerprint probability, which is the
/// contract the table needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateKey(u64);

impl StateKey {
    pub fn encode(obs: &Observation) -> StateKey {
        let mut hasher = FxHasher::default();
        for stock in obs.stocks {
            stock.width().hash(&mut hasher);
            stock.height().hash(&mut hasher);
            for cell in stock.cell_states() {
                cell.hash(&mut hasher);
            }
        }
        for product in obs.products {
            product.size.hash(&mut hasher);
            product.quantity.hash(&mut hasher);
        }
        StateKey(hasher.finish())
    }
}
