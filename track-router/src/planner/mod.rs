//! Route planner using A* search over track segments.
//!
//! This module answers: "I am standing here - what is the cheapest way to
//! reach my destination given the signals and reservations right now?"
//!
//! Search nodes cover whole segments, stretches of track between decision
//! points, rather than single positions. Segment costs that only depend on
//! topology are shared between searches through the segment cache.

mod config;
mod cost;
mod node;
mod open;
mod pool;
mod search;
mod segment;


pub use config::{Penalties, SearchConfig};
pub use cost::CostEvaluator;
pub use node::{ExitDirKey, Node, NodeFlags, NodeId, NodeKey, TrackdirKey};
pub use open::OpenList;
pub use pool::{Admission, NodePool};
pub use search::{
    Origin, Planner, RoutePlan, SearchError, SearchRequest, SearchState, SearchStats,
};
pub use segment::{EndSegmentReasons, Segment};
