//! `Optimize` direction and the worst-value fill-in rule used when a metric is
//! missing or non-finite.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Optimize {
    Minimize,
    Maximize,
}

impl Optimize {
    pub fn from_maximize(maximize: bool) -> Self {
        if maximize {
            Optimize::Maximize
        } else {
            Optimize::Minimize
        }
    }

    /// Ordering to sort a bin's individuals best-first.
    pub fn cmp(self, a: f64, b: f64) -> std::cmp::Ordering {
        match self {
            Optimize::Minimize => a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal),
            Optimize::Maximize => b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal),
        }
    }

    pub fn is_better(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Optimize::Minimize => candidate < incumbent,
            Optimize::Maximize => candidate > incumbent,
        }
    }

    /// The out-of-range value assigned when a metric could not be computed: the
    /// worst feasible value given this direction and the metric's declared range.
    pub fn worst_value(self, range: [f64; 2]) -> f64 {
        let [lo, hi] = range;
        match self {
            Optimize::Minimize => hi,
            Optimize::Maximize => lo,
        }
    }
}
