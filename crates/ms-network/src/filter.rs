//! Per-mode link filters.
//!
//! Routing a mode only over the links that allow it needs a per-mode view
//! of the network.  The views are computed lazily, at most once per mode,
//! and are read-only afterwards, so one cache can be shared by all routing
//! workers of a parallel phase.

use std::sync::OnceLock;

use ms_core::{TransportMode, LinkId};

use crate::Network;

/// Lazily populated `allowed[link]` masks, one per transport mode.
#[derive(Default)]
pub struct ModeFilterCache {
    masks: [OnceLock<Vec<bool>>; TransportMode::ALL.len()],
}

impl ModeFilterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mask of links usable by `mode`.  The first call per mode builds it;
    /// concurrent first calls block until one of them has finished.
    pub fn mask(&self, network: &Network, mode: TransportMode) -> &[bool] {
        self.masks[mode.index()].get_or_init(|| {
            network.link_modes.iter().map(|m| m.contains(mode)).collect()
        })
    }

    #[inline]
    pub fn allows(&self, network: &Network, mode: TransportMode, link: LinkId) -> bool {
        self.mask(network, mode).get(link.index()).copied().unwrap_or(false)
    }

    /// Whether the mask for `mode` has been built yet.
    pub fn is_cached(&self, mode: TransportMode) -> bool {
        self.masks[mode.index()].get().is_some()
    }
}
