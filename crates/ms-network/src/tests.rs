//! Unit tests for ms-network.
//!
//! All tests use hand-built networks.

#[cfg(test)]
mod helpers {
    use ms_core::{Coord, NodeId, TransportMode};
    use crate::{LinkAttrs, Network, NetworkBuilder};

    /// Five nodes, five two-way roads:
    ///
    /// ```text
    ///   0 ──── 1 ──── 2
    ///   │             │
    ///   3 ─────────── 4
    /// ```
    ///
    /// 0→1→2→4 takes 30 s, 0→3→4 takes 40 s.  The 0-3 road is car-only
    /// and the fastest way from 0 to 3; every other road also allows bikes.
    pub fn grid_network() -> (Network, [NodeId; 5]) {
        let mut b = NetworkBuilder::new();
        let n0 = b.add_node(Coord::new(0.0, 0.0));
        let n1 = b.add_node(Coord::new(100.0, 0.0));
        let n2 = b.add_node(Coord::new(200.0, 0.0));
        let n3 = b.add_node(Coord::new(0.0, -100.0));
        let n4 = b.add_node(Coord::new(200.0, -100.0));

        let both = [TransportMode::Car, TransportMode::Bike];
        // 100 m at 10 m/s = 10 s
        b.add_road(n0, n1, LinkAttrs::car(100.0, 10.0, 1_800.0, 1.0).with_modes(&both));
        b.add_road(n1, n2, LinkAttrs::car(100.0, 10.0, 1_800.0, 1.0).with_modes(&both));
        b.add_road(n2, n4, LinkAttrs::car(100.0, 10.0, 1_800.0, 1.0).with_modes(&both));
        // 300 m at 10 m/s = 30 s
        b.add_road(n0, n3, LinkAttrs::car(300.0, 10.0, 1_800.0, 1.0));
        b.add_road(n3, n4, LinkAttrs::car(100.0, 10.0, 1_800.0, 1.0).with_modes(&both));

        (b.build().unwrap(), [n0, n1, n2, n3, n4])
    }
}

// ── Builder & structure ──────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use ms_core::{Coord, LinkId, NodeId};
    use crate::{LinkAttrs, Network, NetworkBuilder, NetworkError};

    #[test]
    fn empty_build() {
        let net = Network::empty();
        assert_eq!(net.node_count(), 0);
        assert_eq!(net.link_count(), 0);
        assert!(net.is_empty());
    }

    #[test]
    fn link_ids_follow_insertion_order() {
        let mut b = NetworkBuilder::new();
        let a = b.add_node(Coord::new(0.0, 0.0));
        let c = b.add_node(Coord::new(10.0, 0.0));
        // Added from the higher node first: ids must not be re-sorted.
        let l0 = b.add_link(c, a, LinkAttrs::car(10.0, 1.0, 100.0, 1.0));
        let l1 = b.add_link(a, c, LinkAttrs::car(10.0, 1.0, 100.0, 1.0));
        let net = b.build().unwrap();
        assert_eq!((l0, l1), (LinkId(0), LinkId(1)));
        assert_eq!(net.link_from[0], c);
        assert_eq!(net.out_links(a), &[l1]);
        assert_eq!(net.in_links(a), &[l0]);
    }

    #[test]
    fn csr_adjacency() {
        let (net, [n0, n1, n2, n3, n4]) = super::helpers::grid_network();
        assert_eq!(net.link_count(), 10);
        assert_eq!(net.out_links(n0).len(), 2);
        assert_eq!(net.in_links(n4).len(), 2);
        for node in [n0, n1, n2, n3, n4] {
            for &l in net.out_links(node) {
                assert_eq!(net.link_from[l.index()], node);
            }
            for &l in net.in_links(node) {
                assert_eq!(net.link_to[l.index()], node);
            }
            let out = net.out_links(node);
            assert!(out.windows(2).all(|w| w[0] < w[1]), "out links sorted");
        }
    }

    #[test]
    fn rejects_unknown_node() {
        let mut b = NetworkBuilder::new();
        let a = b.add_node(Coord::new(0.0, 0.0));
        b.add_link(a, NodeId(9), LinkAttrs::car(10.0, 1.0, 100.0, 1.0));
        assert!(matches!(b.build(), Err(NetworkError::NodeNotFound(NodeId(9)))));
    }

    #[test]
    fn rejects_zero_capacity() {
        let mut b = NetworkBuilder::new();
        let a = b.add_node(Coord::new(0.0, 0.0));
        let c = b.add_node(Coord::new(10.0, 0.0));
        b.add_link(a, c, LinkAttrs::car(10.0, 1.0, 0.0, 1.0));
        assert!(matches!(b.build(), Err(NetworkError::InvalidLink { .. })));
    }

    #[test]
    fn free_travel_time_and_check() {
        let (net, _) = super::helpers::grid_network();
        assert_eq!(net.free_travel_time(LinkId(0)), 10.0);
        assert!(net.check_link(LinkId(9)).is_ok());
        assert!(matches!(net.check_link(LinkId(10)), Err(NetworkError::LinkNotFound(_))));
    }
}

// ── Spatial snap ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod snap {
    use ms_core::{Coord, LinkId};
    use crate::Network;

    #[test]
    fn nearest_node() {
        let (net, [n0, n1, ..]) = super::helpers::grid_network();
        assert_eq!(net.nearest_node(Coord::new(0.0, 0.0)), Some(n0));
        assert_eq!(net.nearest_node(Coord::new(40.0, 5.0)), Some(n0));
        assert_eq!(net.nearest_node(Coord::new(60.0, 5.0)), Some(n1));
    }

    #[test]
    fn nearest_link_prefers_lowest_id_among_equals() {
        let (net, _) = super::helpers::grid_network();
        // Midway along the 0-1 road: links 0 (0→1) and 1 (1→0) are equally near.
        assert_eq!(net.nearest_link(Coord::new(50.0, 3.0)), Some(LinkId(0)));
        // Next to the 3-4 road.
        assert_eq!(net.nearest_link(Coord::new(100.0, -97.0)), Some(LinkId(8)));
    }

    #[test]
    fn empty_network_returns_none() {
        let net = Network::empty();
        assert!(net.nearest_node(Coord::new(0.0, 0.0)).is_none());
        assert!(net.nearest_link(Coord::new(0.0, 0.0)).is_none());
    }
}

// ── Mode filters ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod filter {
    use ms_core::{LinkId, TransportMode};
    use crate::ModeFilterCache;

    #[test]
    fn masks_built_once_per_mode() {
        let (net, _) = super::helpers::grid_network();
        let cache = ModeFilterCache::new();
        assert!(!cache.is_cached(TransportMode::Bike));
        let bike = cache.mask(&net, TransportMode::Bike);
        assert_eq!(bike.iter().filter(|&&b| b).count(), 8);
        assert!(cache.is_cached(TransportMode::Bike));
        assert!(!cache.is_cached(TransportMode::Car));
        assert!(cache.allows(&net, TransportMode::Car, LinkId(6)));
        assert!(!cache.allows(&net, TransportMode::Bike, LinkId(6)));
        assert!(!cache.allows(&net, TransportMode::Car, LinkId(99)));
    }
}

// ── Dijkstra ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod routing {
    use ms_core::{Coord, SimTime, TransportMode};
    use crate::{Dijkstra, LinkAttrs, NetworkBuilder, NetworkError, PathFinder};

    #[test]
    fn trivial_same_node() {
        let (net, [n0, ..]) = super::helpers::grid_network();
        let p = Dijkstra::new()
            .find_path(&net, n0, n0, TransportMode::Car, SimTime::ZERO)
            .unwrap();
        assert!(p.is_trivial());
        assert_eq!(p.travel_time_secs, 0.0);
    }

    #[test]
    fn shortest_path_correct() {
        let (net, [n0, n1, n2, _, n4]) = super::helpers::grid_network();
        let p = Dijkstra::new()
            .find_path(&net, n0, n4, TransportMode::Car, SimTime::ZERO)
            .unwrap();
        assert_eq!(p.travel_time_secs, 30.0);
        assert_eq!(p.distance_m, 300.0);
        assert_eq!(p.links.len(), 3);
        assert_eq!(net.link_from[p.links[0].index()], n0);
        assert_eq!(net.link_to[p.links[0].index()], n1);
        assert_eq!(net.link_to[p.links[1].index()], n2);
        assert_eq!(net.link_to[p.links[2].index()], n4);
    }

    #[test]
    fn respects_mode_restrictions() {
        let (net, [n0, _, _, n3, _]) = super::helpers::grid_network();
        let router = Dijkstra::new();
        // By car 0→3 is the direct 30 s road; bikes may not use it and
        // detour over 1, 2 and 4.
        let car = router.find_path(&net, n0, n3, TransportMode::Car, SimTime::ZERO).unwrap();
        assert_eq!(car.links.len(), 1);
        assert_eq!(car.travel_time_secs, 30.0);
        let bike = router.find_path(&net, n0, n3, TransportMode::Bike, SimTime::ZERO).unwrap();
        assert_eq!(bike.links.len(), 4);
        assert_eq!(bike.travel_time_secs, 40.0);
    }

    #[test]
    fn no_path_for_disallowed_mode() {
        let (net, [n0, _, _, _, n4]) = super::helpers::grid_network();
        let r = Dijkstra::new().find_path(&net, n0, n4, TransportMode::Walk, SimTime::ZERO);
        assert!(matches!(r, Err(NetworkError::NoPath { mode: TransportMode::Walk, .. })));
    }

    #[test]
    fn one_way_blocks_return() {
        let mut b = NetworkBuilder::new();
        let a = b.add_node(Coord::new(0.0, 0.0));
        let c = b.add_node(Coord::new(0.0, 100.0));
        b.add_link(a, c, LinkAttrs::car(100.0, 10.0, 600.0, 1.0));
        let net = b.build().unwrap();
        let router = Dijkstra::new();
        assert!(router.find_path(&net, a, c, TransportMode::Car, SimTime::ZERO).is_ok());
        assert!(router.find_path(&net, c, a, TransportMode::Car, SimTime::ZERO).is_err());
    }
}
