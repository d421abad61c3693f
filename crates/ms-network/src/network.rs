//! Network representation and builder.
//!
//! # Data layout
//!
//! Links keep the id they were given when added (`LinkId` = insertion
//! index), so scenario data can refer to them stably.  Per-link attributes are
//! stored as parallel arrays indexed by `LinkId`.
//!
//! Adjacency is kept in **Compressed Sparse Row (CSR)** form in both
//! directions.  The outgoing links of `NodeId n` are
//!
//! ```text
//! out_links[ out_start[n] .. out_start[n+1] ]
//! ```
//!
//! and likewise `in_links`/`in_start` for incoming links.  Within a node the
//! links appear in ascending `LinkId` order, which makes every traversal
//! (Dijkstra relaxation, the queue engine's node loop) deterministic.
//!
//! # Spatial index
//!
//! Two R-trees (via `rstar`): one over node coordinates and one over link
//! segments.  Used while preparing plans to attach activities that only carry
//! a coordinate to the nearest link.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use ms_core::{Coord, LinkId, ModeSet, NodeId, TransportMode};

use crate::{NetworkError, NetworkResult};

// ── R-tree entries ────────────────────────────────────────────────────────────

#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2],
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// A link as a straight segment between its end nodes.
#[derive(Clone)]
struct LinkEntry {
    from: [f64; 2],
    to: [f64; 2],
    id: LinkId,
}

impl RTreeObject for LinkEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.from, self.to)
    }
}

impl PointDistance for LinkEntry {
    /// Squared distance from `point` to the closest point on the segment.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let (ax, ay) = (self.from[0], self.from[1]);
        let (dx, dy) = (self.to[0] - ax, self.to[1] - ay);
        let len_2 = dx * dx + dy * dy;
        let t = if len_2 == 0.0 {
            0.0
        } else {
            (((point[0] - ax) * dx + (point[1] - ay) * dy) / len_2).clamp(0.0, 1.0)
        };
        let px = ax + t * dx - point[0];
        let py = ay + t * dy - point[1];
        px * px + py * py
    }
}

// ── LinkAttrs ─────────────────────────────────────────────────────────────────

/// Static attributes of a directed link.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkAttrs {
    /// Length in metres.
    pub length_m: f64,
    /// Free-flow speed in m/s.
    pub freespeed_mps: f64,
    /// Flow capacity in vehicles per hour.
    pub capacity_vph: f64,
    /// Number of lanes (may be fractional).
    pub lanes: f64,
    /// Modes allowed on this link.
    pub modes: ModeSet,
}

impl LinkAttrs {
    /// Car-only link with the given geometry and capacity.
    pub fn car(length_m: f64, freespeed_mps: f64, capacity_vph: f64, lanes: f64) -> Self {
        Self {
            length_m,
            freespeed_mps,
            capacity_vph,
            lanes,
            modes: ModeSet::of(&[TransportMode::Car]),
        }
    }

    pub fn with_modes(mut self, modes: &[TransportMode]) -> Self {
        self.modes = ModeSet::of(modes);
        self
    }
}

// ── Network ───────────────────────────────────────────────────────────────────

/// Directed link/node graph with CSR adjacency and spatial indices.
///
/// Read-only once built.  All attribute arrays are `pub` for direct indexed
/// access on hot paths.  Construct with [`NetworkBuilder`].
pub struct Network {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Position of each node.  Indexed by `NodeId`.
    pub node_coord: Vec<Coord>,

    // ── Link data (indexed by LinkId) ─────────────────────────────────────
    pub link_from: Vec<NodeId>,
    pub link_to: Vec<NodeId>,
    pub link_length_m: Vec<f64>,
    pub link_freespeed_mps: Vec<f64>,
    pub link_capacity_vph: Vec<f64>,
    pub link_lanes: Vec<f64>,
    pub link_modes: Vec<ModeSet>,

    // ── CSR adjacency ─────────────────────────────────────────────────────
    out_start: Vec<u32>,
    out_links: Vec<LinkId>,
    in_start: Vec<u32>,
    in_links: Vec<LinkId>,

    // ── Spatial indices ───────────────────────────────────────────────────
    node_idx: RTree<NodeEntry>,
    link_idx: RTree<LinkEntry>,
}

impl Network {
    /// A network with no nodes or links.
    ///
    /// Enough for populations that only use teleported modes.
    pub fn empty() -> Self {
        NetworkBuilder::new().build_unchecked()
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_coord.len()
    }

    pub fn link_count(&self) -> usize {
        self.link_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_coord.is_empty()
    }

    /// Iterator over all link ids in ascending order.
    pub fn link_ids(&self) -> impl Iterator<Item = LinkId> + '_ {
        (0..self.link_count()).map(|i| LinkId(i as u32))
    }

    /// Iterator over all node ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.node_count()).map(|i| NodeId(i as u32))
    }

    /// `Ok(())` if `link` exists in this network.
    pub fn check_link(&self, link: LinkId) -> NetworkResult<()> {
        if link.index() < self.link_count() {
            Ok(())
        } else {
            Err(NetworkError::LinkNotFound(link))
        }
    }

    // ── Traversal ─────────────────────────────────────────────────────────

    /// Outgoing links of `node`, ascending by id.
    #[inline]
    pub fn out_links(&self, node: NodeId) -> &[LinkId] {
        let start = self.out_start[node.index()] as usize;
        let end   = self.out_start[node.index() + 1] as usize;
        &self.out_links[start..end]
    }

    /// Incoming links of `node`, ascending by id.
    #[inline]
    pub fn in_links(&self, node: NodeId) -> &[LinkId] {
        let start = self.in_start[node.index()] as usize;
        let end   = self.in_start[node.index() + 1] as usize;
        &self.in_links[start..end]
    }

    // ── Link helpers ──────────────────────────────────────────────────────

    /// Free-flow travel time of `link` in seconds.
    #[inline]
    pub fn free_travel_time(&self, link: LinkId) -> f64 {
        self.link_length_m[link.index()] / self.link_freespeed_mps[link.index()]
    }

    #[inline]
    pub fn allows(&self, link: LinkId, mode: TransportMode) -> bool {
        self.link_modes[link.index()].contains(mode)
    }

    /// Coordinate of the link's downstream node.  Activities located on a
    /// link without an explicit coordinate are placed here.
    #[inline]
    pub fn link_to_coord(&self, link: LinkId) -> Coord {
        self.node_coord[self.link_to[link.index()].index()]
    }

    #[inline]
    pub fn link_from_coord(&self, link: LinkId) -> Coord {
        self.node_coord[self.link_from[link.index()].index()]
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Nearest node to `pos`.  `None` only if the network has no nodes.
    pub fn nearest_node(&self, pos: Coord) -> Option<NodeId> {
        self.node_idx.nearest_neighbor(&[pos.x, pos.y]).map(|e| e.id)
    }

    /// Nearest link to `pos` by perpendicular distance.
    ///
    /// Among equally close links (both directions of a road) the smallest id
    /// wins.  `None` only if the network has no links.
    pub fn nearest_link(&self, pos: Coord) -> Option<LinkId> {
        let mut iter = self.link_idx.nearest_neighbor_iter_with_distance_2(&[pos.x, pos.y]);
        let (first, best_d2) = iter.next()?;
        let mut best = first.id;
        for (entry, d2) in iter {
            if d2 > best_d2 {
                break;
            }
            best = best.min(entry.id);
        }
        Some(best)
    }
}

// ── NetworkBuilder ────────────────────────────────────────────────────────────

/// Construct a [`Network`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use ms_core::Coord;
/// use ms_network::{LinkAttrs, NetworkBuilder};
///
/// let mut b = NetworkBuilder::new();
/// let a = b.add_node(Coord::new(0.0, 0.0));
/// let c = b.add_node(Coord::new(1_000.0, 0.0));
/// b.add_road(a, c, LinkAttrs::car(1_000.0, 13.9, 1_800.0, 1.0));
/// let net = b.build().unwrap();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.link_count(), 2); // both directions
/// ```
#[derive(Default)]
pub struct NetworkBuilder {
    nodes: Vec<Coord>,
    links: Vec<RawLink>,
}

struct RawLink {
    from:  NodeId,
    to:    NodeId,
    attrs: LinkAttrs,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(nodes: usize, links: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            links: Vec::with_capacity(links),
        }
    }

    /// Add a node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, coord: Coord) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(coord);
        id
    }

    /// Add a **directed** link and return its `LinkId` (sequential from 0).
    pub fn add_link(&mut self, from: NodeId, to: NodeId, attrs: LinkAttrs) -> LinkId {
        let id = LinkId(self.links.len() as u32);
        self.links.push(RawLink { from, to, attrs });
        id
    }

    /// Add a link in each direction; returns `(a → b, b → a)`.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, attrs: LinkAttrs) -> (LinkId, LinkId) {
        let forward = self.add_link(a, b, attrs.clone());
        let back = self.add_link(b, a, attrs);
        (forward, back)
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn link_count(&self) -> usize { self.links.len() }

    /// Validate and consume the builder.
    ///
    /// Fails if a link references an unknown node or has a non-positive
    /// length, speed, capacity or lane count.
    pub fn build(self) -> NetworkResult<Network> {
        let node_count = self.nodes.len();
        for (i, raw) in self.links.iter().enumerate() {
            let link = LinkId(i as u32);
            for node in [raw.from, raw.to] {
                if node.index() >= node_count {
                    return Err(NetworkError::NodeNotFound(node));
                }
            }
            let a = &raw.attrs;
            let bad = [
                ("length", a.length_m),
                ("freespeed", a.freespeed_mps),
                ("capacity", a.capacity_vph),
                ("lanes", a.lanes),
            ]
            .into_iter()
            .find(|(_, v)| !(*v > 0.0));
            if let Some((what, value)) = bad {
                return Err(NetworkError::InvalidLink {
                    link,
                    reason: format!("{what} must be positive, got {value}"),
                });
            }
        }
        Ok(self.build_unchecked())
    }

    fn build_unchecked(self) -> Network {
        let node_count = self.nodes.len();
        let raw = self.links;

        let (out_start, out_links) = csr(node_count, raw.iter().map(|l| l.from));
        let (in_start, in_links) = csr(node_count, raw.iter().map(|l| l.to));

        let node_entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, c)| NodeEntry { point: [c.x, c.y], id: NodeId(i as u32) })
            .collect();
        let link_entries: Vec<LinkEntry> = raw
            .iter()
            .enumerate()
            .map(|(i, l)| {
                let (f, t) = (self.nodes[l.from.index()], self.nodes[l.to.index()]);
                LinkEntry { from: [f.x, f.y], to: [t.x, t.y], id: LinkId(i as u32) }
            })
            .collect();

        Network {
            link_from:          raw.iter().map(|l| l.from).collect(),
            link_to:            raw.iter().map(|l| l.to).collect(),
            link_length_m:      raw.iter().map(|l| l.attrs.length_m).collect(),
            link_freespeed_mps: raw.iter().map(|l| l.attrs.freespeed_mps).collect(),
            link_capacity_vph:  raw.iter().map(|l| l.attrs.capacity_vph).collect(),
            link_lanes:         raw.iter().map(|l| l.attrs.lanes).collect(),
            link_modes:         raw.iter().map(|l| l.attrs.modes).collect(),
            node_coord: self.nodes,
            out_start,
            out_links,
            in_start,
            in_links,
            node_idx: RTree::bulk_load(node_entries),
            link_idx: RTree::bulk_load(link_entries),
        }
    }
}

/// Build a CSR row pointer and column array grouping link ids by `key` node.
/// Links keep ascending id order within each row.
fn csr(node_count: usize, keys: impl Iterator<Item = NodeId> + Clone) -> (Vec<u32>, Vec<LinkId>) {
    let mut start = vec![0u32; node_count + 1];
    for node in keys.clone() {
        start[node.index() + 1] += 1;
    }
    for i in 1..=node_count {
        start[i] += start[i - 1];
    }
    let mut fill = start.clone();
    let mut cols = vec![LinkId::INVALID; start[node_count] as usize];
    for (i, node) in keys.enumerate() {
        let slot = &mut fill[node.index()];
        cols[*slot as usize] = LinkId(i as u32);
        *slot += 1;
    }
    (start, cols)
}
