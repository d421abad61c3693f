//! A commuter corridor with a slower bypass.
//!
//! ```text
//!            ┌──────── bypass (60 km/h, 1200/h) ────────┐
//!            │                                          │
//! suburb ── S ──── M1 ──── BR ═══ bridge ═══ M2 ──── downtown
//!                 (80 km/h, 3600/h; bridge 1 lane, 900/h)
//! ```
//!
//! Every road is two-way.

use anyhow::Result;
use ms_core::Coord;
use ms_network::{LinkAttrs, Network, NetworkBuilder};

pub const SUBURB: Coord = Coord::new(-500.0, 100.0);
pub const DOWNTOWN: Coord = Coord::new(8_500.0, 100.0);

pub fn build_network() -> Result<Network> {
    let mut b = NetworkBuilder::new();

    let s = b.add_node(Coord::new(0.0, 0.0));
    let m1 = b.add_node(Coord::new(2_500.0, 0.0));
    let br = b.add_node(Coord::new(4_000.0, 0.0));
    let m2 = b.add_node(Coord::new(5_000.0, 0.0));
    let dt = b.add_node(Coord::new(8_000.0, 0.0));
    let bypass = b.add_node(Coord::new(4_000.0, 3_000.0));
    let suburb = b.add_node(Coord::new(-1_000.0, 0.0));
    let downtown = b.add_node(Coord::new(9_000.0, 0.0));

    let arterial = |len| LinkAttrs::car(len, 80.0 / 3.6, 3_600.0, 2.0);
    b.add_road(suburb, s, LinkAttrs::car(1_000.0, 50.0 / 3.6, 3_600.0, 2.0));
    b.add_road(s, m1, arterial(2_500.0));
    b.add_road(m1, br, arterial(1_500.0));
    b.add_road(br, m2, LinkAttrs::car(1_000.0, 80.0 / 3.6, 900.0, 1.0));
    b.add_road(m2, dt, arterial(3_000.0));
    b.add_road(dt, downtown, LinkAttrs::car(1_000.0, 50.0 / 3.6, 3_600.0, 2.0));

    let slow = |len| LinkAttrs::car(len, 60.0 / 3.6, 1_200.0, 1.0);
    b.add_road(s, bypass, slow(5_000.0));
    b.add_road(bypass, dt, slow(5_000.0));

    Ok(b.build()?)
}
