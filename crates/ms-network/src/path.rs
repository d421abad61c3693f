//! Shortest-path trait and default Dijkstra implementation.
//!
//! # Pluggability
//!
//! The network routing module talks to path search through [`PathFinder`], so
//! applications can swap in time-dependent or A* implementations without
//! touching the router.
//!
//! # Cost units
//!
//! Costs are free-flow travel times, accumulated in integer **milliseconds**
//! inside the search so that ties are exact and resolved by `NodeId`.
//! [`Path`] reports the exact floating-point sum in seconds.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ms_core::{LinkId, NodeId, SimTime, TransportMode};

use crate::{ModeFilterCache, Network, NetworkError, NetworkResult};

// ── Path ──────────────────────────────────────────────────────────────────────

/// Links from a start node to an end node.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// Links to traverse in order.
    pub links: Vec<LinkId>,
    /// Sum of free-flow travel times, seconds.
    pub travel_time_secs: f64,
    /// Sum of link lengths, metres.
    pub distance_m: f64,
}

impl Path {
    pub fn empty() -> Self {
        Path { links: Vec::new(), travel_time_secs: 0.0, distance_m: 0.0 }
    }

    /// `true` if start and end node coincide.
    pub fn is_trivial(&self) -> bool {
        self.links.is_empty()
    }
}

// ── PathFinder trait ──────────────────────────────────────────────────────────

/// Pluggable least-cost path search.
///
/// Must be `Send + Sync`: routes are computed on worker threads while plans
/// are prepared and replanned.
pub trait PathFinder: Send + Sync {
    /// Least-cost path from `from` to `to` using only links that allow
    /// `mode`, for a departure at `departure`.
    fn find_path(
        &self,
        network: &Network,
        from: NodeId,
        to: NodeId,
        mode: TransportMode,
        departure: SimTime,
    ) -> NetworkResult<Path>;
}

// ── Dijkstra ──────────────────────────────────────────────────────────────────

/// Dijkstra over free-flow travel times, restricted per mode through a
/// shared [`ModeFilterCache`].  Ignores the departure time.
#[derive(Default)]
pub struct Dijkstra {
    filters: ModeFilterCache,
}

impl Dijkstra {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(&self) -> &ModeFilterCache {
        &self.filters
    }
}

impl PathFinder for Dijkstra {
    fn find_path(
        &self,
        network: &Network,
        from: NodeId,
        to: NodeId,
        mode: TransportMode,
        _departure: SimTime,
    ) -> NetworkResult<Path> {
        for node in [from, to] {
            if node.index() >= network.node_count() {
                return Err(NetworkError::NodeNotFound(node));
            }
        }
        if from == to {
            return Ok(Path::empty());
        }

        let allowed = self.filters.mask(network, mode);
        let n = network.node_count();
        let mut dist      = vec![u64::MAX; n];
        let mut prev_link = vec![LinkId::INVALID; n];
        dist[from.index()] = 0;

        // Min-heap on (cost, node); NodeId breaks ties deterministically.
        let mut heap: BinaryHeap<Reverse<(u64, NodeId)>> = BinaryHeap::new();
        heap.push(Reverse((0, from)));

        while let Some(Reverse((cost, node))) = heap.pop() {
            if node == to {
                return Ok(reconstruct(network, &prev_link, to));
            }
            if cost > dist[node.index()] {
                continue;
            }
            for &link in network.out_links(node) {
                if !allowed[link.index()] {
                    continue;
                }
                let next = network.link_to[link.index()];
                let new_cost = cost.saturating_add(cost_ms(network, link));
                if new_cost < dist[next.index()] {
                    dist[next.index()] = new_cost;
                    prev_link[next.index()] = link;
                    heap.push(Reverse((new_cost, next)));
                }
            }
        }

        Err(NetworkError::NoPath { from, to, mode })
    }
}

#[inline]
fn cost_ms(network: &Network, link: LinkId) -> u64 {
    (network.free_travel_time(link) * 1_000.0).round() as u64
}

fn reconstruct(network: &Network, prev_link: &[LinkId], to: NodeId) -> Path {
    let mut links = Vec::new();
    let mut cur = to;
    loop {
        let l = prev_link[cur.index()];
        if l == LinkId::INVALID {
            break;
        }
        links.push(l);
        cur = network.link_from[l.index()];
    }
    links.reverse();
    let travel_time_secs = links.iter().map(|&l| network.free_travel_time(l)).sum();
    let distance_m = links.iter().map(|&l| network.link_length_m[l.index()]).sum();
    Path { links, travel_time_secs, distance_m }
}
