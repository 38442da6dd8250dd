use ndarray::{s, Array2};

const FREE: u8 = 0;
const OCCUPIED: u8 = 1;

/// Occupancy grid for a single stock sheet.
///
/// Cells are indexed `[x, y]` with `x` running along the width. The grid is
/// owned by the environment; the policy only reads it through shared
/// references, so a decision step never mutates occupancy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockGrid {
    cells: Array2<u8>,
}

impl StockGrid {
    /// Create a fully free grid with the given dimensions.
    pub fn new(width: usize, height: usize) -> StockGrid {
        StockGrid {
            cells: Array2::from_elem((width, height), FREE),
        }
    }

    pub fn width(&self) -> usize {
        self.cells.dim().0
    }

    pub fn height(&self) -> usize {
        self.cells.dim().1
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    /// Number of cells currently marked occupied.
    pub fn occupied_area(&self) -> usize {
        self.cells.iter().filter(|&&c| c != FREE).count()
    }

    /// Iterate over raw cell states in a fixed (row-major) order.
    pub fn cell_states(&self) -> impl Iterator<Item = u8> + '_ {
        self.cells.iter().copied()
    }

    /// True when a `size` rectangle anchored at `pos` lies within bounds
    /// and covers only free cells.
    pub fn can_place(&self, pos: (usize, usize), size: (usize, usize)) -> bool {
        let (x, y) = pos;
        let (pw, ph) = size;
        if pw == 0 || ph == 0 {
            return false;
        }
        if x + pw > self.width() || y + ph > self.height() {
            return false;
        }
        self.cells
            .slice(s![x..x + pw, y..y + ph])
            .iter()
            .all(|&c| c == FREE)
    }

    /// First-fit placement search.
    ///
    /// Scans candidate anchors with x outermost and y innermost, returning
    /// the first feasible position. The returned position is therefore the
    /// lexicographically smallest (x, then y) feasible anchor; the scan
    /// order must not change or placement sequences stop being
    /// reproducible.
    pub fn find_position(&self, size: (usize, usize)) -> Option<(usize, usize)> {
        let (pw, ph) = size;
        if pw == 0 || ph == 0 || pw > self.width() || ph > self.height() {
            return None;
        }
        for x in 0..=self.width() - pw {
            for y in 0..=self.height() - ph {
                if self.can_place((x, y), size) {
                    return Some((x, y));
                }
            }
        }
        None
    }

    /// Mark a rectangle occupied. Caller must have checked `can_place`;
    /// used by the environment when it applies an action.
    pub fn place(&mut self, pos: (usize, usize), size: (usize, usize)) {
        let (x, y) = pos;
        let (pw, ph) = size;
        self.cells
            .slice_mut(s![x..x + pw, y..y + ph])
            .fill(OCCUPIED);
    }

    /// Mark every cell occupied. Test helper for exhausted-stock scenarios.
    pub fn fill_all(&mut self) {
        self.cells.fill(OCCUPIED);
    }
}
