use crate::state::{Action, Observation};

/// Reward when no valid placement exists anywhere.
pub const NO_ACTION_PENALTY: f64 = -5.0;
/// Base reward for any successful placement.
pub const PLACEMENT_BASE: f64 = 10.0;
/// Weight on the filled ratio of the targeted stock.
pub const FILL_WEIGHT: f64 = 20.0;
/// Reward when the action names a stock/position that is not free.
pub const CONFLICT_PENALTY: f64 = -10.0;

/// Score an action against the current observation.
///
/// A sentinel action always scores [`NO_ACTION_PENALTY`]. A placement
/// that is actually free on the named stock scores
/// `PLACEMENT_BASE + FILL_WEIGHT * filled_ratio`, with the filled ratio
/// being item area over that stock's area, so larger cuts from the same
/// sheet score strictly higher. An action whose stock index or position
/// does not check out scores [`CONFLICT_PENALTY`]; placement search never
/// produces such an action, but the model scores it rather than panics
/// because it signals a fault in the caller, not here.
pub fn score(action: &Action, obs: &Observation) -> f64 {
    let Some(idx) = action.stock_idx else {
        return NO_ACTION_PENALTY;
    };
    match obs.stocks.get(idx) {
        Some(stock) if stock.can_place(action.position, action.size) => {
            let filled = (action.size.0 * action.size.1) as f64 / stock.area() as f64;
            PLACEMENT_BASE + FILL_WEIGHT * filled
        }
        _ => CONFLICT_PENALTY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::StockGrid;
    use crate::state::Product;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    fn single_stock_obs<'a>(stock: &'a StockGrid, products: &'a [Product]) -> Observation<'a> {
        Observation {
            stocks: std::slice::from_ref(stock),
            products,
        }
    }

    #[test]
    fn two_by_two_on_four_by_four_scores_fifteen() {
        // Arrange
        let stock = StockGrid::new(4, 4);
        let products = vec![Product::new(2, 2, 1)];
        let obs = single_stock_obs(&stock, &products);
        let action = Action::place(0, (2, 2), (0, 0));
        // Act / Assert: 10 + 20 * (4 / 16)
        assert_abs_diff_eq!(score(&action, &obs), 15.0, epsilon = f64::EPSILON);
    }

    #[test_case((0, 0), (0, 0); "canonical sentinel")]
    #[test_case((1, 1), (0, 0); "unit size")]
    #[test_case((3, 2), (9, 9); "arbitrary fields")]
    fn sentinel_scores_minus_five(size: (usize, usize), position: (usize, usize)) {
        let stock = StockGrid::new(4, 4);
        let products = vec![];
        let obs = single_stock_obs(&stock, &products);
        let action = Action {
            stock_idx: None,
            size,
            position,
        };
        assert_abs_diff_eq!(score(&action, &obs), NO_ACTION_PENALTY);
    }

    #[test]
    fn larger_fill_scores_strictly_higher() {
        let stock = StockGrid::new(6, 6);
        let products = vec![];
        let obs = single_stock_obs(&stock, &products);
        let small = score(&Action::place(0, (2, 2), (0, 0)), &obs);
        let large = score(&Action::place(0, (4, 4), (0, 0)), &obs);
        assert!(large > small);
    }

    #[test]
    fn occupied_target_scores_conflict() {
        let mut stock = StockGrid::new(4, 4);
        stock.place((0, 0), (2, 2));
        let products = vec![];
        let obs = single_stock_obs(&stock, &products);
        let action = Action::place(0, (2, 2), (1, 1));
        assert_abs_diff_eq!(score(&action, &obs), CONFLICT_PENALTY);
    }

    #[test]
    fn out_of_range_stock_scores_conflict() {
        let stock = StockGrid::new(4, 4);
        let products = vec![];
        let obs = single_stock_obs(&stock, &products);
        let action = Action::place(7, (1, 1), (0, 0));
        assert_abs_diff_eq!(score(&action, &obs), CONFLICT_PENALTY);
    }
}
