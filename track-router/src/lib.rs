//! Rail route planner.
//!
//! An A* search that answers: "I'm a train standing at this track position,
//! what is the cheapest way to my destination given the signals and
//! reservations ahead?"

pub mod cache;
pub mod domain;
pub mod graph;
pub mod planner;
