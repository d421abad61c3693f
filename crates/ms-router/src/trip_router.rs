//! `TripRouter`: one routing module per mode.

use ms_core::{SimConfig, SimTime, TransportMode};
use ms_network::{Network, PathFinder};
use ms_population::{Facility, Person, PlanElement};

use crate::{
    NetworkRoutingModule, RoutingError, RoutingModule, RoutingResult, TeleportationRoutingModule,
};

/// Dispatches trips to the routing module registered for their mode.
pub struct TripRouter<'a> {
    modules: [Option<Box<dyn RoutingModule + 'a>>; TransportMode::ALL.len()],
}

impl Default for TripRouter<'_> {
    fn default() -> Self {
        Self { modules: std::array::from_fn(|_| None) }
    }
}

impl<'a> TripRouter<'a> {
    /// A router with no modules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Network modules for every `qsim.network_modes` entry, teleportation
    /// modules for every `routing.teleported_modes` entry.
    ///
    /// Fails if a teleported mode has no speed.
    pub fn from_config(
        config: &SimConfig,
        network: &'a Network,
        path_finder: &'a dyn PathFinder,
    ) -> RoutingResult<Self> {
        let mut router = Self::new();
        for &mode in &config.qsim.network_modes {
            router.set_module(mode, Box::new(NetworkRoutingModule::new(mode, network, path_finder)));
        }
        for params in &config.routing.teleported_modes {
            let speed = params.speed_mps.ok_or(RoutingError::MissingSpeed(params.mode))?;
            router.set_module(
                params.mode,
                Box::new(TeleportationRoutingModule::new(
                    params.mode,
                    speed,
                    params.beeline_distance_factor,
                )),
            );
        }
        Ok(router)
    }

    /// Register `module` for `mode`, replacing any previous one.
    pub fn set_module(&mut self, mode: TransportMode, module: Box<dyn RoutingModule + 'a>) {
        self.modules[mode.index()] = Some(module);
    }

    pub fn has_module(&self, mode: TransportMode) -> bool {
        self.modules[mode.index()].is_some()
    }

    /// Route one trip with the module for `mode`.
    pub fn calc_route(
        &self,
        mode: TransportMode,
        from: &Facility,
        to: &Facility,
        departure: SimTime,
        person: &Person,
    ) -> RoutingResult<Vec<PlanElement>> {
        let module = self.modules[mode.index()]
            .as_deref()
            .ok_or(RoutingError::NoModuleForMode(mode))?;
        module.calc_route(from, to, departure, person)
    }
}
