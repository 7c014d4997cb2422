//! Tab stop positions.

/// The set of columns with a tab stop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tabstops {
    cols: usize,
    stops: Vec<bool>,
}

/// Default tab interval.
pub const TABSTOP_INTERVAL: usize = 8;

impl Tabstops {
    /// Stops every [`TABSTOP_INTERVAL`] columns, the power-on state.
    pub fn new(cols: usize) -> Self {
        let mut t = Self {
            cols,
            stops: vec![false; cols],
        };
        t.reset();
        t
    }

    /// Restore the default interval stops.
    pub fn reset(&mut self) {
        for (x, stop) in self.stops.iter_mut().enumerate() {
            *stop = x != 0 && x % TABSTOP_INTERVAL == 0;
        }
    }

    /// Set a stop at a column (HTS).
    pub fn set(&mut self, col: usize) {
        if let Some(stop) = self.stops.get_mut(col) {
            *stop = true;
        }
    }

    /// Clear a stop at a column (TBC 0).
    pub fn clear(&mut self, col: usize) {
        if let Some(stop) = self.stops.get_mut(col) {
            *stop = false;
        }
    }

    /// Clear every stop (TBC 3).
    pub fn clear_all(&mut self) {
        self.stops.fill(false);
    }

    /// Whether a column has a stop.
    pub fn is_set(&self, col: usize) -> bool {
        self.stops.get(col).copied().unwrap_or(false)
    }

    /// The next stop strictly after `col`, or the last column.
    pub fn next_stop(&self, col: usize) -> usize {
        ((col + 1)..self.cols)
            .find(|&x| self.stops[x])
            .unwrap_or(self.cols - 1)
    }

    /// The previous stop strictly before `col`, or column 0.
    pub fn prev_stop(&self, col: usize) -> usize {
        (0..col).rev().find(|&x| self.stops[x]).unwrap_or(0)
    }

    /// Columns with stops, ascending.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.stops
            .iter()
            .enumerate()
            .filter_map(|(x, &set)| set.then_some(x))
    }

    /// Whether the set matches the power-on default.
    pub fn is_default(&self) -> bool {
        self.stops
            .iter()
            .enumerate()
            .all(|(x, &set)| set == (x != 0 && x % TABSTOP_INTERVAL == 0))
    }
}
