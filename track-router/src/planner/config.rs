//! Search configuration for the track router.

use serde::Deserialize;

use crate::domain::Cost;

/// Cost coefficients applied on top of base track costs.
///
/// All penalties default to zero. Their magnitudes are routing policy and
/// have to be chosen by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Penalties {
    /// Added to every curved move.
    pub curve: Cost,

    /// Added to every move up or down a slope.
    pub slope: Cost,

    /// Added to every move onto the diverging leg of a junction.
    pub branch: Cost,

    /// Stop aspect on the first signal ahead (entry presignal).
    pub first_red: Cost,

    /// Stop aspect on the first signal ahead (exit or combo presignal).
    pub first_red_exit: Cost,

    /// Target reached behind a presignal showing stop.
    pub last_red: Cost,

    /// Target reached behind an exit presignal showing stop.
    pub last_red_exit: Cost,

    /// Reserved position, or path signal showing stop, inside a
    /// reservation-based section.
    pub reservation: Cost,

    /// Reserved station position inside a reservation-based section.
    pub station_reservation: Cost,

    /// Number of signals ahead of the train subject to look-ahead costs.
    pub look_ahead_max_signals: u16,

    /// Look-ahead cost for the i-th signal is `p0 + i * (p1 + i * p2)`.
    pub look_ahead_p0: Cost,
    pub look_ahead_p1: Cost,
    pub look_ahead_p2: Cost,
}

impl Penalties {
    /// Look-ahead cost of a stop aspect on the `index`-th signal ahead.
    pub fn look_ahead(&self, index: u16) -> Cost {
        if index >= self.look_ahead_max_signals {
            return 0;
        }
        let i = Cost::from(index);
        self.look_ahead_p0.saturating_add(
            i.saturating_mul(self.look_ahead_p1.saturating_add(i.saturating_mul(self.look_ahead_p2))),
        )
    }
}

/// Configuration parameters for a route search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Closed-node budget. Reaching it fails the search as over budget.
    pub max_search_nodes: usize,

    /// Paths costing more than this are pruned. `None` disables the ceiling.
    pub max_path_cost: Option<Cost>,

    /// Static segment cost after which a walk is cut short.
    pub max_segment_cost: Cost,

    /// Skip the segment cache entirely (every segment is walked).
    pub disable_cache: bool,

    pub penalties: Penalties,
}

impl SearchConfig {
    /// Create a new configuration with the given limits and penalties.
    pub fn new(
        max_search_nodes: usize,
        max_path_cost: Option<Cost>,
        max_segment_cost: Cost,
        penalties: Penalties,
    ) -> Self {
        Self {
            max_search_nodes,
            max_path_cost,
            max_segment_cost,
            disable_cache: false,
            penalties,
        }
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_search_nodes: 10_000,
            max_path_cost: None,
            max_segment_cost: 10_000,
            disable_cache: false,
            penalties: Penalties::default(),
        }
    }
}
