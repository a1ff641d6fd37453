//! Cost and rule evaluation for freshly created nodes.
//!
//! A node starts at some position and covers track up to the next decision
//! point. The evaluator resolves that stretch (from the segment cache or by
//! walking it), prices it, applies signal rules at its end and decides
//! whether the node is worth keeping.

use std::collections::HashSet;

use tracing::{trace, warn};

use crate::cache::{CacheStats, SegmentStore};
use crate::domain::{Cost, PathPos, SignalType, TileArea};
use crate::graph::{Destination, EdgeKind, SignalState, TileKind, TrackEdge, TrackGraph};

use super::config::SearchConfig;
use super::node::{Node, NodeKey};
use super::segment::{EndSegmentReasons, Segment};

/// Result of walking a segment element by element.
#[derive(Debug, Clone, Copy)]
struct Walk {
    last: PathPos,
    cost: Cost,
    last_signal: Option<PathPos>,
    end_reason: EndSegmentReasons,
    area: TileArea,

    /// Reservation penalties picked up on the way. Never cached.
    reservation_cost: Cost,
}

impl Walk {
    /// Whether the walk reached a real segment boundary.
    ///
    /// Walks cut by the path cost ceiling, or stopped by the destination in
    /// the middle of plain track, end somewhere another search would not.
    fn is_cacheable(&self) -> bool {
        !self.end_reason.contains(EndSegmentReasons::PATH_TOO_LONG)
            && !self.end_reason.cacheable().is_empty()
    }

    fn segment(&self) -> Segment {
        Segment::new(self.last, self.cost, self.last_signal, self.end_reason, self.area)
    }
}

/// Completes nodes for one search.
pub struct CostEvaluator<'a, G: ?Sized, S: ?Sized> {
    graph: &'a G,
    signals: &'a S,
    destination: &'a dyn Destination,
    config: &'a SearchConfig,

    edges: Vec<TrackEdge>,
    seen: HashSet<PathPos>,

    stats: CacheStats,
    path_too_long: bool,
}

impl<'a, G, S> CostEvaluator<'a, G, S>
where
    G: TrackGraph + ?Sized,
    S: SignalState + ?Sized,
{
    pub fn new(
        graph: &'a G,
        signals: &'a S,
        destination: &'a dyn Destination,
        config: &'a SearchConfig,
    ) -> Self {
        Self {
            graph,
            signals,
            destination,
            config,
            edges: Vec::new(),
            seen: HashSet::new(),
            stats: CacheStats::default(),
            path_too_long: false,
        }
    }

    /// Cache hits and misses seen by this evaluator.
    pub fn cache_stats(&self) -> CacheStats {
        self.stats
    }

    /// Whether any node was dropped for exceeding the path cost ceiling.
    pub fn pruned_by_path_cost(&self) -> bool {
        self.path_too_long
    }

    /// Cost of moving along `edge`, penalties included.
    pub fn transition_cost(&self, edge: &TrackEdge) -> Cost {
        let penalties = &self.config.penalties;
        let penalty = match edge.kind {
            EdgeKind::Straight => 0,
            EdgeKind::Curve => penalties.curve,
            EdgeKind::Slope => penalties.slope,
            EdgeKind::Branch => penalties.branch,
        };
        edge.cost.saturating_add(penalty)
    }

    /// Resolve the segment of `node`, price it and apply the signal and
    /// target rules.
    ///
    /// `node.cost` must hold the parent's cost on entry (zero or the origin
    /// cost for origins); `entry_cost` is the price of the move onto
    /// `node.pos`. Returns false when the node ends in a way that cannot be
    /// continued and did not reach the destination.
    pub fn complete_node<K, C>(&mut self, node: &mut Node<K>, entry_cost: Cost, cache: &mut C) -> bool
    where
        K: NodeKey,
        C: SegmentStore + ?Sized,
    {
        let base = node.cost.saturating_add(entry_cost);
        let in_reservation = node.last_signal_type.is_pbs();
        let use_cache = !self.config.disable_cache;

        let cached = if use_cache {
            self.lookup(cache, node.pos)
        } else {
            None
        };

        let (segment, mut reasons, mut extra) = match cached {
            Some(segment) => {
                let reserved = if in_reservation {
                    self.reservations_along(node.pos, &segment)
                } else {
                    0
                };
                (segment, segment.end_reason, reserved)
            }
            None => {
                let walk = self.walk(node.pos, base, in_reservation);
                let segment = walk.segment();
                if use_cache && walk.is_cacheable() {
                    self.write_back(cache, node.pos, segment);
                }
                (segment, walk.end_reason, walk.reservation_cost)
            }
        };

        if let Some(at) = segment.last_signal {
            extra = extra.saturating_add(self.apply_signal(node, at, &mut reasons));
        }

        let mut cost = base.saturating_add(segment.cost).saturating_add(extra);
        if self.exceeds_path_limit(cost) {
            reasons |= EndSegmentReasons::PATH_TOO_LONG;
        }

        if reasons.contains(EndSegmentReasons::PATH_TOO_LONG) {
            reasons.remove(EndSegmentReasons::TARGET_REACHED);
        } else if reasons.contains(EndSegmentReasons::TARGET_REACHED) {
            node.flags.target_seen = true;
            cost = cost.saturating_add(self.last_red_cost(node));
        }

        node.cost = cost;
        node.end_reason = reasons;
        node.set_segment(segment);

        if reasons.contains(EndSegmentReasons::PATH_TOO_LONG) {
            self.path_too_long = true;
            trace!(pos = %node.pos, cost, "node over path cost ceiling");
            return false;
        }
        if reasons.is_abort() && !node.flags.target_seen {
            trace!(pos = %node.pos, reasons = ?reasons, "branch aborted");
            return false;
        }
        true
    }

    /// Probe the cache for the segment starting at `pos`.
    ///
    /// Entries that may pass over the destination count as misses: the walk
    /// has to stop at the goal, wherever it lies.
    fn lookup<C>(&mut self, cache: &C, pos: PathPos) -> Option<Segment>
    where
        C: SegmentStore + ?Sized,
    {
        let found = cache
            .lookup(&pos)
            .filter(|segment| !self.destination.may_be_within(&segment.area));
        if found.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        found
    }

    /// Walk from `start` up to the next decision point or the destination.
    fn walk(&mut self, start: PathPos, base: Cost, in_reservation: bool) -> Walk {
        self.seen.clear();
        let mut cur = start;
        let mut area = TileArea::point(start.tile);
        let mut cost: Cost = 0;
        let mut reservation_cost: Cost = 0;
        let mut last_signal = None;
        let mut reasons = EndSegmentReasons::empty();

        loop {
            self.seen.insert(cur);
            area.extend(cur.tile);

            if in_reservation {
                reservation_cost = reservation_cost.saturating_add(self.reservation_penalty(cur));
            }

            match self.graph.tile_kind(cur) {
                TileKind::Plain => {}
                TileKind::Station => reasons |= EndSegmentReasons::STATION,
                TileKind::Waypoint => reasons |= EndSegmentReasons::WAYPOINT,
                TileKind::Depot => reasons |= EndSegmentReasons::DEPOT,
            }

            if let Some(signal) = self.signals.signal_at(cur) {
                reasons |= EndSegmentReasons::SIGNAL;
                if signal.kind.is_pbs() {
                    reasons |= EndSegmentReasons::SAFE_TILE;
                }
                last_signal = Some(cur);
            }

            let so_far = base.saturating_add(cost).saturating_add(reservation_cost);
            if self.exceeds_path_limit(so_far) {
                reasons |= EndSegmentReasons::PATH_TOO_LONG;
            }

            self.edges.clear();
            self.graph.follow(cur, &mut self.edges);
            match self.edges.len() {
                0 => reasons |= EndSegmentReasons::DEAD_END,
                1 => {}
                _ => reasons |= EndSegmentReasons::CHOICE_FOLLOWS,
            }

            if self.destination.is_destination(cur) {
                reasons |= EndSegmentReasons::TARGET_REACHED;
            }

            if !reasons.is_empty() {
                break;
            }

            let edge = self.edges[0];
            if self.seen.contains(&edge.to) {
                reasons |= EndSegmentReasons::INFINITE_LOOP;
                break;
            }
            if cost > self.config.max_segment_cost {
                reasons |= EndSegmentReasons::SEGMENT_TOO_LONG;
                break;
            }

            cost = cost.saturating_add(self.transition_cost(&edge));
            cur = edge.to;
        }

        Walk {
            last: cur,
            cost,
            last_signal,
            end_reason: reasons,
            area,
            reservation_cost,
        }
    }

    /// Reservation penalties over a cached segment.
    ///
    /// Follows the segment again unless the signal state can rule out any
    /// reservation in its area.
    fn reservations_along(&mut self, start: PathPos, segment: &Segment) -> Cost {
        if !self.signals.may_be_reserved_within(&segment.area) {
            return 0;
        }

        self.seen.clear();
        self.seen.insert(start);
        let mut cur = start;
        let mut cost = self.reservation_penalty(cur);

        while cur != segment.last {
            self.edges.clear();
            self.graph.follow(cur, &mut self.edges);
            let [edge] = self.edges.as_slice() else {
                warn!(at = %cur, successors = self.edges.len(), "segment interior changed since it was cached");
                break;
            };
            let next = edge.to;
            if !self.seen.insert(next) {
                warn!(at = %cur, "loop while following cached segment");
                break;
            }
            cur = next;
            cost = cost.saturating_add(self.reservation_penalty(cur));
        }
        cost
    }

    fn reservation_penalty(&self, pos: PathPos) -> Cost {
        if !self.signals.is_reserved(pos) {
            return 0;
        }
        let penalties = &self.config.penalties;
        match self.graph.tile_kind(pos) {
            TileKind::Station => penalties.station_reservation,
            _ => penalties.reservation,
        }
    }

    /// Store a walked segment, checking it against any existing entry.
    fn write_back<C>(&self, cache: &mut C, key: PathPos, segment: Segment)
    where
        C: SegmentStore + ?Sized,
    {
        if let Some(existing) = cache.lookup(&key) {
            if existing != segment {
                warn!(
                    pos = %key,
                    cached_cost = existing.cost,
                    walked_cost = segment.cost,
                    cached_last = %existing.last,
                    walked_last = %segment.last,
                    "cached segment disagrees with walk; was the cache cleared after a layout change?"
                );
                debug_assert_eq!(existing, segment, "stale segment for {key}");
            }
        }
        cache.insert(key, segment);
    }

    /// Apply the rules of the signal at `at` to `node`. Returns the cost.
    fn apply_signal<K: NodeKey>(
        &self,
        node: &mut Node<K>,
        at: PathPos,
        reasons: &mut EndSegmentReasons,
    ) -> Cost {
        let Some(signal) = self.signals.signal_at(at) else {
            return 0;
        };
        let penalties = &self.config.penalties;
        let mut cost: Cost = 0;

        if !signal.is_stop() {
            node.flags.last_signal_was_red = false;
        } else if signal.kind.is_pbs() {
            cost = penalties.reservation;
        } else if signal.kind.is_presignal() {
            if node.signals_passed == 0 {
                cost = if signal.kind.is_exit_like() {
                    penalties.first_red_exit
                } else {
                    penalties.first_red
                };
            }
            cost = cost.saturating_add(penalties.look_ahead(node.signals_passed));
            node.flags.last_signal_was_red = true;
            node.last_red_signal_type = signal.kind;
        } else {
            *reasons |= EndSegmentReasons::RED_SIGNAL;
        }

        node.signals_passed = node.signals_passed.saturating_add(1);
        node.last_signal_type = signal.kind;
        cost
    }
    /// Extra cost for a target reached behind a signal showing stop.
    fn last_red_cost<K: NodeKey>(&self, node: &Node<K>) -> Cost {
        if !node.flags.last_signal_was_red {
            return 0;
        }
        let penalties = &self.config.penalties;
        match node.last_red_signal_type {
            SignalType::Exit => penalties.last_red_exit,
            kind if kind.is_pbs() => 0,
            _ => penalties.last_red,
        }
    }

    fn exceeds_path_limit(&self, cost: Cost) -> bool {
        self.config.max_path_cost.is_some_and(|max| cost > max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SegmentCache;
    use crate::domain::{Signal, SignalAspect, TileIndex, Trackdir};
    use crate::graph::{DestinationTiles, TrackLayout};
    use crate::planner::config::Penalties;
    use crate::planner::node::{NodeId, TrackdirKey};

    fn pos(x: u16) -> PathPos {
        PathPos::new(TileIndex::new(x, 0), Trackdir::XNe)
    }

    /// Straight line 0 -> 1 -> ... -> n, `cost` per move.
    fn line(n: u16, cost: Cost) -> TrackLayout {
        let mut layout = TrackLayout::new();
        for x in 0..n {
            layout.add_edge(pos(x), pos(x + 1), cost, EdgeKind::Straight);
        }
        layout
    }

    fn origin(x: u16, start_signal: SignalType) -> Node<TrackdirKey> {
        Node::origin(pos(x), 0, start_signal)
    }

    fn nowhere() -> DestinationTiles {
        DestinationTiles::default()
    }

    #[test]
    fn walks_to_dead_end() {
        let layout = line(2, 10);
        let config = SearchConfig::default();
        let dest = DestinationTiles::new([TileIndex::new(2, 0)]);
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);
        let mut cache = SegmentCache::default();

        let mut node = origin(0, SignalType::Block);
        assert!(eval.complete_node(&mut node, 0, &mut cache));

        assert_eq!(node.cost, 20);
        assert_eq!(node.last_pos(), pos(2));
        assert!(node.is_target());
        assert!(node.end_reason.contains(EndSegmentReasons::DEAD_END));
        assert!(node.end_reason.contains(EndSegmentReasons::TARGET_REACHED));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn dead_end_without_target_is_dropped() {
        let layout = line(2, 10);
        let config = SearchConfig::default();
        let dest = nowhere();
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);

        let mut node = origin(0, SignalType::Block);
        assert!(!eval.complete_node(&mut node, 0, &mut SegmentCache::default()));
    }

    #[test]
    fn stops_before_choice() {
        let mut layout = line(2, 10);
        layout.add_edge(pos(2), pos(3), 10, EdgeKind::Straight);
        layout.add_edge(pos(2), pos(9), 10, EdgeKind::Branch);
        let config = SearchConfig::default();
        let dest = nowhere();
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);

        let mut node = origin(0, SignalType::Block);
        assert!(eval.complete_node(&mut node, 0, &mut SegmentCache::default()));
        assert_eq!(node.last_pos(), pos(2));
        assert_eq!(node.end_reason, EndSegmentReasons::CHOICE_FOLLOWS);
    }

    #[test]
    fn edge_kind_penalties() {
        let mut layout = TrackLayout::new();
        layout
            .add_edge(pos(0), pos(1), 10, EdgeKind::Curve)
            .add_edge(pos(1), pos(2), 10, EdgeKind::Slope)
            .add_edge(pos(2), pos(3), 10, EdgeKind::Branch);
        let penalties = Penalties {
            curve: 1,
            slope: 20,
            branch: 300,
            ..Penalties::default()
        };
        let config = SearchConfig::new(100, None, 10_000, penalties);
        let dest = |p: PathPos| p == pos(3);
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);

        let mut node = origin(0, SignalType::Block);
        assert!(eval.complete_node(&mut node, 0, &mut SegmentCache::default()));
        assert_eq!(node.cost, 30 + 1 + 20 + 300);
    }

    #[test]
    fn cache_hit_matches_walk() {
        let layout = line(4, 7);
        let config = SearchConfig::default();
        let dest = nowhere();
        let mut cache = SegmentCache::default();

        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);
        let mut cold = origin(0, SignalType::Block);
        eval.complete_node(&mut cold, 0, &mut cache);
        let mut warm = origin(0, SignalType::Block);
        eval.complete_node(&mut warm, 0, &mut cache);

        assert_eq!(eval.cache_stats(), CacheStats { hits: 1, misses: 1 });
        assert_eq!(cold.cost, warm.cost);
        assert_eq!(cold.segment(), warm.segment());
        assert_eq!(cold.end_reason, warm.end_reason);
    }

    #[test]
    fn disabled_cache_is_untouched() {
        let layout = line(4, 7);
        let config = SearchConfig {
            disable_cache: true,
            ..SearchConfig::default()
        };
        let dest = nowhere();
        let mut cache = SegmentCache::default();
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);

        eval.complete_node(&mut origin(0, SignalType::Block), 0, &mut cache);
        assert!(cache.is_empty());
        assert_eq!(eval.cache_stats(), CacheStats::default());
    }

    #[test]
    fn red_block_signal_aborts() {
        let mut layout = line(3, 10);
        layout.set_signal(pos(1), Signal::new(SignalType::Block, SignalAspect::Stop));
        let config = SearchConfig::default();
        let dest = DestinationTiles::new([TileIndex::new(3, 0)]);
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);

        let mut node = origin(0, SignalType::Block);
        assert!(!eval.complete_node(&mut node, 0, &mut SegmentCache::default()));
        assert_eq!(node.last_pos(), pos(1));
        assert!(node.end_reason.contains(EndSegmentReasons::SIGNAL | EndSegmentReasons::RED_SIGNAL));
        assert_eq!(node.signals_passed, 1);
    }

    #[test]
    fn green_signal_ends_segment_only() {
        let mut layout = line(3, 10);
        layout.set_signal(pos(1), Signal::new(SignalType::Block, SignalAspect::Go));
        let config = SearchConfig::default();
        let dest = nowhere();
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);

        let mut node = origin(0, SignalType::Block);
        node.flags.last_signal_was_red = true;
        assert!(eval.complete_node(&mut node, 0, &mut SegmentCache::default()));
        assert_eq!(node.cost, 10);
        assert_eq!(node.end_reason, EndSegmentReasons::SIGNAL);
        assert!(!node.flags.last_signal_was_red);
        assert_eq!(node.last_signal_type, SignalType::Block);
    }

    #[test]
    fn red_presignal_penalties() {
        let mut layout = line(3, 10);
        layout.set_signal(pos(1), Signal::new(SignalType::Exit, SignalAspect::Stop));
        let penalties = Penalties {
            first_red: 1,
            first_red_exit: 100,
            look_ahead_max_signals: 4,
            look_ahead_p0: 5,
            ..Penalties::default()
        };
        let config = SearchConfig::new(100, None, 10_000, penalties);
        let dest = nowhere();
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);

        let mut node = origin(0, SignalType::Block);
        assert!(eval.complete_node(&mut node, 0, &mut SegmentCache::default()));
        assert_eq!(node.cost, 10 + 100 + 5);
        assert!(node.flags.last_signal_was_red);
        assert_eq!(node.last_red_signal_type, SignalType::Exit);
        assert_eq!(node.last_signal_type, SignalType::Exit);
    }

    #[test]
    fn later_red_presignal_only_pays_look_ahead() {
        let mut layout = line(3, 10);
        layout.set_signal(pos(1), Signal::new(SignalType::Entry, SignalAspect::Stop));
        let penalties = Penalties {
            first_red: 1_000,
            look_ahead_max_signals: 4,
            look_ahead_p0: 5,
            look_ahead_p1: 3,
            ..Penalties::default()
        };
        let config = SearchConfig::new(100, None, 10_000, penalties);
        let dest = nowhere();
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);

        let mut node = origin(0, SignalType::Block);
        node.signals_passed = 2;
        assert!(eval.complete_node(&mut node, 0, &mut SegmentCache::default()));
        assert_eq!(node.cost, 10 + 5 + 2 * 3);
        assert_eq!(node.signals_passed, 3);
    }

    #[test]
    fn last_red_penalty_at_target() {
        let mut layout = line(2, 10);
        layout.set_tile_kind(TileIndex::new(1, 0), TileKind::Station);
        let penalties = Penalties {
            last_red: 7,
            last_red_exit: 70,
            ..Penalties::default()
        };
        let config = SearchConfig::new(100, None, 10_000, penalties);
        let dest = DestinationTiles::new([TileIndex::new(1, 0)]);
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);

        let mut node = origin(0, SignalType::Block);
        node.flags.last_signal_was_red = true;
        node.last_red_signal_type = SignalType::Exit;
        assert!(eval.complete_node(&mut node, 0, &mut SegmentCache::default()));
        assert!(node.is_target());
        assert_eq!(node.cost, 10 + 70);

        let mut node = origin(0, SignalType::Block);
        node.flags.last_signal_was_red = true;
        node.last_red_signal_type = SignalType::Entry;
        assert!(eval.complete_node(&mut node, 0, &mut SegmentCache::default()));
        assert_eq!(node.cost, 10 + 7);
    }

    #[test]
    fn red_path_signal_is_passable_at_a_price() {
        let mut layout = line(3, 10);
        layout.set_signal(pos(1), Signal::new(SignalType::Pbs, SignalAspect::Stop));
        let penalties = Penalties {
            reservation: 40,
            ..Penalties::default()
        };
        let config = SearchConfig::new(100, None, 10_000, penalties);
        let dest = nowhere();
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);

        let mut node = origin(0, SignalType::Block);
        assert!(eval.complete_node(&mut node, 0, &mut SegmentCache::default()));
        assert_eq!(node.cost, 10 + 40);
        assert!(node.end_reason.contains(EndSegmentReasons::SAFE_TILE));
        assert!(!node.end_reason.contains(EndSegmentReasons::RED_SIGNAL));
        assert_eq!(node.last_signal_type, SignalType::Pbs);
    }

    #[test]
    fn reservations_cost_only_in_path_signal_sections() {
        let mut layout = line(2, 10);
        layout.reserve(pos(1));
        let penalties = Penalties {
            reservation: 500,
            ..Penalties::default()
        };
        let config = SearchConfig::new(100, None, 10_000, penalties);
        let dest = DestinationTiles::new([TileIndex::new(2, 0)]);
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);

        let mut block = origin(0, SignalType::Block);
        assert!(eval.complete_node(&mut block, 0, &mut SegmentCache::default()));
        assert_eq!(block.cost, 20);

        let mut pbs = origin(0, SignalType::Pbs);
        assert!(eval.complete_node(&mut pbs, 0, &mut SegmentCache::default()));
        assert_eq!(pbs.cost, 520);
    }

    #[test]
    fn reserved_station_uses_station_penalty() {
        let mut layout = line(2, 10);
        layout.reserve(pos(1)).reserve(pos(2));
        layout.set_tile_kind(TileIndex::new(2, 0), TileKind::Station);
        let penalties = Penalties {
            reservation: 500,
            station_reservation: 3,
            ..Penalties::default()
        };
        let config = SearchConfig::new(100, None, 10_000, penalties);
        let dest = DestinationTiles::new([TileIndex::new(2, 0)]);
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);

        let mut node = origin(0, SignalType::PbsOneway);
        assert!(eval.complete_node(&mut node, 0, &mut SegmentCache::default()));
        assert_eq!(node.cost, 20 + 500 + 3);
    }

    #[test]
    fn reservation_section_reads_cache_and_reprices() {
        let mut layout = line(2, 10);
        layout.reserve(pos(1));
        let penalties = Penalties {
            reservation: 500,
            ..Penalties::default()
        };
        let config = SearchConfig::new(100, None, 10_000, penalties);
        let dest = nowhere();
        let mut cache = SegmentCache::default();
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);

        let mut first = origin(0, SignalType::Pbs);
        eval.complete_node(&mut first, 0, &mut cache);
        let mut second = origin(0, SignalType::Pbs);
        eval.complete_node(&mut second, 0, &mut cache);
        let mut block = origin(0, SignalType::Block);
        eval.complete_node(&mut block, 0, &mut cache);

        assert_eq!(first.cost, 520);
        assert_eq!(second.cost, 520);
        assert_eq!(block.cost, 20);
        assert_eq!(eval.cache_stats(), CacheStats { hits: 2, misses: 1 });
        assert_eq!(cache.peek(&pos(0)).map(|s| s.cost), Some(20));
    }

    #[test]
    fn target_on_plain_track_ends_segment() {
        let layout = line(4, 10);
        let config = SearchConfig::default();
        let dest = DestinationTiles::new([TileIndex::new(2, 0)]);
        let mut cache = SegmentCache::default();
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);

        let mut node = origin(0, SignalType::Block);
        assert!(eval.complete_node(&mut node, 0, &mut cache));
        assert!(node.is_target());
        assert_eq!(node.last_pos(), pos(2));
        assert_eq!(node.end_reason, EndSegmentReasons::TARGET_REACHED);
        assert_eq!(node.cost, 20);
        assert!(cache.is_empty());
    }

    #[test]
    fn target_at_choice_point() {
        let mut layout = line(2, 10);
        layout.add_edge(pos(2), pos(3), 10, EdgeKind::Straight);
        layout.add_edge(pos(2), pos(9), 10, EdgeKind::Branch);
        let config = SearchConfig::default();
        let dest = DestinationTiles::new([TileIndex::new(2, 0)]);
        let mut cache = SegmentCache::default();
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);

        let mut node = origin(0, SignalType::Block);
        assert!(eval.complete_node(&mut node, 0, &mut cache));
        assert!(node.is_target());
        assert_eq!(
            node.end_reason,
            EndSegmentReasons::CHOICE_FOLLOWS | EndSegmentReasons::TARGET_REACHED
        );
        assert_eq!(
            cache.peek(&pos(0)).map(|s| s.end_reason),
            Some(EndSegmentReasons::CHOICE_FOLLOWS)
        );
    }

    #[test]
    fn cached_segment_over_destination_is_walked() {
        let layout = line(4, 10);
        let config = SearchConfig::default();
        let mut cache = SegmentCache::default();

        let elsewhere = nowhere();
        let mut eval = CostEvaluator::new(&layout, &layout, &elsewhere, &config);
        eval.complete_node(&mut origin(0, SignalType::Block), 0, &mut cache);
        assert_eq!(cache.peek(&pos(0)).map(|s| s.last), Some(pos(4)));

        let dest = DestinationTiles::new([TileIndex::new(3, 0)]);
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);
        let mut node = origin(0, SignalType::Block);
        assert!(eval.complete_node(&mut node, 0, &mut cache));
        assert!(node.is_target());
        assert_eq!(node.last_pos(), pos(3));
        assert_eq!(node.cost, 30);
        assert_eq!(eval.cache_stats(), CacheStats { hits: 0, misses: 1 });
        assert_eq!(cache.peek(&pos(0)).map(|s| s.last), Some(pos(4)));
    }

    #[test]
    fn presignal_stop_is_not_a_hard_block() {
        let mut layout = line(3, 10);
        layout.set_signal(pos(1), Signal::new(SignalType::Combo, SignalAspect::Stop));
        let config = SearchConfig::default();
        let dest = nowhere();
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);

        let mut node = origin(0, SignalType::Block);
        assert!(eval.complete_node(&mut node, 0, &mut SegmentCache::default()));
        assert!(!node.end_reason.contains(EndSegmentReasons::RED_SIGNAL));
        assert!(node.flags.last_signal_was_red);
        assert_eq!(node.last_red_signal_type, SignalType::Combo);
    }

    #[test]
    fn ring_is_an_infinite_loop() {
        let mut layout = line(3, 10);
        layout.add_edge(pos(3), pos(1), 10, EdgeKind::Curve);
        let config = SearchConfig::default();
        let dest = nowhere();
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);

        let mut node = origin(0, SignalType::Block);
        assert!(!eval.complete_node(&mut node, 0, &mut SegmentCache::default()));
        assert_eq!(node.last_pos(), pos(3));
        assert!(node.end_reason.contains(EndSegmentReasons::INFINITE_LOOP));
    }

    #[test]
    fn long_segment_is_split() {
        let layout = line(10, 10);
        let config = SearchConfig::new(100, None, 25, Penalties::default());
        let dest = nowhere();
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);

        let mut node = origin(0, SignalType::Block);
        assert!(eval.complete_node(&mut node, 0, &mut SegmentCache::default()));
        assert_eq!(node.end_reason, EndSegmentReasons::SEGMENT_TOO_LONG);
        assert_eq!(node.last_pos(), pos(3));
        assert_eq!(node.cost, 30);
    }

    #[test]
    fn path_cost_ceiling_prunes_and_skips_cache() {
        let layout = line(10, 10);
        let config = SearchConfig::new(100, Some(35), 10_000, Penalties::default());
        let dest = DestinationTiles::new([TileIndex::new(10, 0)]);
        let mut cache = SegmentCache::default();
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);

        let mut node = origin(0, SignalType::Block);
        assert!(!eval.complete_node(&mut node, 0, &mut cache));
        assert!(node.end_reason.contains(EndSegmentReasons::PATH_TOO_LONG));
        assert!(eval.pruned_by_path_cost());
        assert!(cache.is_empty());
    }

    #[test]
    fn entry_cost_counts_towards_node_cost() {
        let layout = line(1, 10);
        let config = SearchConfig::default();
        let dest = DestinationTiles::new([TileIndex::new(1, 0)]);
        let mut eval = CostEvaluator::new(&layout, &layout, &dest, &config);

        let mut parent = origin(5, SignalType::Block);
        parent.cost = 100;
        let mut child = Node::child(NodeId(0), &parent, pos(0), false);
        assert!(eval.complete_node(&mut child, 4, &mut SegmentCache::default()));
        assert_eq!(child.cost, 100 + 4 + 10);
    }
}
