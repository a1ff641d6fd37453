//! A* route search over a track graph.
//!
//! The search is seeded from one or more origins and repeatedly expands the
//! open node with the lowest estimate until a node that reached the
//! destination is popped, the frontier runs dry or the node budget is spent.

use std::collections::HashSet;
use std::marker::PhantomData;

use tracing::{debug, trace, warn};

use crate::cache::SegmentStore;
use crate::domain::{Cost, PathPos, SignalType};
use crate::graph::{Destination, Heuristic, SignalState, TrackEdge, TrackGraph, ZeroHeuristic};

use super::config::SearchConfig;
use super::cost::CostEvaluator;
use super::node::{Node, NodeId, NodeKey, TrackdirKey};
use super::open::OpenList;
use super::pool::{Admission, NodePool};

/// Error from route search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// Every reachable branch was explored without reaching the destination
    #[error("no path to the destination exists")]
    NoPathExists,

    /// The node budget or path cost ceiling cut the search short
    #[error("search budget exceeded after closing {closed} nodes")]
    SearchBudgetExceeded { closed: usize },

    /// An origin is not a position of the track graph
    #[error("origin {0} is not on the track graph")]
    InvalidStart(PathPos),

    /// Invalid search request
    #[error("invalid search request: {0}")]
    InvalidRequest(String),
}

/// A place the vehicle may start from, with the cost of starting there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub pos: PathPos,
    pub cost: Cost,
}

impl Origin {
    pub fn new(pos: PathPos, cost: Cost) -> Self {
        Self { pos, cost }
    }
}

/// Request for one route search.
#[derive(Clone, Copy)]
pub struct SearchRequest<'a> {
    /// Candidate starting positions.
    pub origins: &'a [Origin],

    /// Goal predicate.
    pub destination: &'a dyn Destination,

    /// Lower bound on the remaining cost.
    pub heuristic: &'a dyn Heuristic,

    /// Signalling discipline in force at the origins.
    pub start_signal: SignalType,
}

impl<'a> SearchRequest<'a> {
    /// Create a request searching without a heuristic, starting inside a
    /// path-signal section.
    pub fn new(origins: &'a [Origin], destination: &'a dyn Destination) -> Self {
        Self {
            origins,
            destination,
            heuristic: &ZeroHeuristic,
            start_signal: SignalType::Pbs,
        }
    }

    pub fn with_heuristic(mut self, heuristic: &'a dyn Heuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_start_signal(mut self, start_signal: SignalType) -> Self {
        self.start_signal = start_signal;
        self
    }

    /// Validate the request against `graph`.
    pub fn validate<G: TrackGraph + ?Sized>(&self, graph: &G) -> Result<(), SearchError> {
        if self.origins.is_empty() {
            return Err(SearchError::InvalidRequest("no origins given".to_string()));
        }

        if let Some(origin) = self.origins.iter().find(|o| !graph.contains(o.pos)) {
            return Err(SearchError::InvalidStart(origin.pos));
        }

        Ok(())
    }
}

/// Lifecycle of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Running,
    Succeeded,
    Failed,
}

/// Counters collected during one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes admitted to the pool, superseded ones included.
    pub nodes_created: usize,

    /// Nodes expanded.
    pub nodes_closed: usize,

    pub cache_hits: u64,
    pub cache_misses: u64,
}

/// A found route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePlan {
    /// Every position from the origin to the goal.
    pub path: Vec<PathPos>,

    /// Total cost, origin cost included.
    pub cost: Cost,

    /// The origin the route starts from.
    pub origin: PathPos,

    /// First position after the first branch point on the route, if any.
    ///
    /// This is the decision a vehicle has to act on next.
    pub first_choice: Option<PathPos>,

    pub stats: SearchStats,
}

/// Route planner over one track graph.
///
/// `K` decides which nodes count as the same search state; see
/// [`TrackdirKey`] and [`ExitDirKey`](super::node::ExitDirKey).
pub struct Planner<'a, G: ?Sized, S: ?Sized, K = TrackdirKey> {
    graph: &'a G,
    signals: &'a S,
    config: &'a SearchConfig,
    _key: PhantomData<fn() -> K>,
}

impl<'a, G, S> Planner<'a, G, S, TrackdirKey>
where
    G: TrackGraph + ?Sized,
    S: SignalState + ?Sized,
{
    /// Create a new planner.
    pub fn new(graph: &'a G, signals: &'a S, config: &'a SearchConfig) -> Self {
        Self {
            graph,
            signals,
            config,
            _key: PhantomData,
        }
    }
}

impl<'a, G, S, K> Planner<'a, G, S, K>
where
    G: TrackGraph + ?Sized,
    S: SignalState + ?Sized,
    K: NodeKey,
{
    /// Switch to another node key.
    pub fn with_key<K2: NodeKey>(self) -> Planner<'a, G, S, K2> {
        Planner {
            graph: self.graph,
            signals: self.signals,
            config: self.config,
            _key: PhantomData,
        }
    }

    /// Find the cheapest route for `request`.
    ///
    /// Segments are read from and written to `cache`, which may be shared
    /// between searches as long as the layout does not change in between.
    pub fn search<C>(&self, request: &SearchRequest<'_>, cache: &mut C) -> Result<RoutePlan, SearchError>
    where
        C: SegmentStore + ?Sized,
    {
        request.validate(self.graph)?;

        let mut state = SearchState::Running;
        debug!(
            state = ?state,
            origins = request.origins.len(),
            start_signal = ?request.start_signal,
            max_nodes = self.config.max_search_nodes,
            "Route search started"
        );

        let mut pool: NodePool<K> = NodePool::new();
        let mut open = OpenList::new();
        let mut eval = CostEvaluator::new(self.graph, self.signals, request.destination, self.config);
        let mut edges: Vec<TrackEdge> = Vec::new();
        let mut closed = 0usize;

        for origin in request.origins {
            let mut node = Node::origin(origin.pos, origin.cost, request.start_signal);
            if eval.complete_node(&mut node, 0, cache) {
                enqueue(&mut pool, &mut open, node, request.heuristic);
            }
        }

        let outcome = loop {
            let Some(id) = open.pop() else {
                break if eval.pruned_by_path_cost() {
                    Err(SearchError::SearchBudgetExceeded { closed })
                } else {
                    Err(SearchError::NoPathExists)
                };
            };
            if !pool.is_open(id) {
                continue;
            }
            if pool.get(id).is_target() {
                break Ok(id);
            }
            if closed >= self.config.max_search_nodes {
                break Err(SearchError::SearchBudgetExceeded { closed });
            }

            pool.close(id);
            closed += 1;

            let from = pool.get(id).last_pos();
            edges.clear();
            self.graph.follow(from, &mut edges);
            let is_choice = edges.len() > 1;

            trace!(
                from = %from,
                cost = pool.get(id).cost,
                successors = edges.len(),
                "Expanding node"
            );

            for edge in &edges {
                let mut child = Node::child(id, pool.get(id), edge.to, is_choice);
                let entry_cost = eval.transition_cost(edge);
                if eval.complete_node(&mut child, entry_cost, cache) {
                    enqueue(&mut pool, &mut open, child, request.heuristic);
                }
            }
        };

        let cache_stats = eval.cache_stats();
        let stats = SearchStats {
            nodes_created: pool.len(),
            nodes_closed: closed,
            cache_hits: cache_stats.hits,
            cache_misses: cache_stats.misses,
        };

        match outcome {
            Ok(goal) => {
                state = SearchState::Succeeded;
                let plan = self.build_plan(&pool, goal, stats);
                debug!(
                    state = ?state,
                    cost = plan.cost,
                    positions = plan.path.len(),
                    nodes = stats.nodes_created,
                    closed = stats.nodes_closed,
                    cache_hits = stats.cache_hits,
                    "Route search complete"
                );
                Ok(plan)
            }
            Err(error) => {
                state = SearchState::Failed;
                debug!(
                    state = ?state,
                    %error,
                    nodes = stats.nodes_created,
                    closed = stats.nodes_closed,
                    queued = pool.open_count(),
                    "Route search complete"
                );
                Err(error)
            }
        }
    }

    fn build_plan(&self, pool: &NodePool<K>, goal: NodeId, stats: SearchStats) -> RoutePlan {
        let chain = pool.chain(goal);
        let mut path = Vec::new();
        for &id in &chain {
            self.retrace_segment(pool.get(id), &mut path);
        }

        let first_choice = chain
            .iter()
            .map(|&id| pool.get(id))
            .find(|node| node.flags.choice_seen)
            .map(|node| node.pos);

        RoutePlan {
            path,
            cost: pool.get(goal).cost,
            origin: pool.get(chain[0]).pos,
            first_choice,
            stats,
        }
    }

    /// Append the positions of `node`'s segment to `path`.
    ///
    /// Cached segments only know their end points, so the interior is
    /// followed through the graph again. Interior positions have exactly one
    /// successor.
    fn retrace_segment(&self, node: &Node<K>, path: &mut Vec<PathPos>) {
        let last = node.last_pos();
        let mut cur = node.pos;
        let mut seen = HashSet::from([cur]);
        let mut edges = Vec::new();
        path.push(cur);

        while cur != last {
            edges.clear();
            self.graph.follow(cur, &mut edges);
            let [edge] = edges.as_slice() else {
                warn!(at = %cur, successors = edges.len(), "segment interior changed since it was cached");
                break;
            };
            if !seen.insert(edge.to) {
                warn!(at = %cur, "loop while re-tracing segment");
                break;
            }
            cur = edge.to;
            path.push(cur);
        }
    }
}

/// Set the estimate of a completed node and offer it to the pool.
fn enqueue<K: NodeKey>(
    pool: &mut NodePool<K>,
    open: &mut OpenList,
    mut node: Node<K>,
    heuristic: &dyn Heuristic,
) {
    node.estimate = if node.is_target() {
        node.cost
    } else {
        node.cost.saturating_add(heuristic.estimate(node.last_pos()))
    };
    let (estimate, signals_passed) = (node.estimate, node.signals_passed);

    match pool.admit(node) {
        Admission::New(id) | Admission::Improved(id) => open.push(id, estimate, signals_passed),
        Admission::Rejected => {}
    }
}
