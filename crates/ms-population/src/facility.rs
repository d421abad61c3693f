//! Trip end points as seen by routers.

use ms_core::{Coord, LinkId};

/// A resolved location: the link the agent is on and where it is.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Facility {
    pub link: LinkId,
    pub coord: Coord,
}

impl Facility {
    pub fn new(link: LinkId, coord: Coord) -> Self {
        Self { link, coord }
    }
}
