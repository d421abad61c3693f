//! Unit tests for ms-core primitives.

#[cfg(test)]
mod ids {
    use crate::{AgentId, LinkId, NodeId};

    #[test]
    fn index_roundtrip() {
        let id = LinkId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(LinkId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(AgentId(0) < AgentId(1));
        assert!(NodeId(100) > NodeId(99));
    }

    #[test]
    fn default_is_invalid() {
        assert_eq!(AgentId::default(), AgentId::INVALID);
        assert_eq!(LinkId::INVALID.0, u32::MAX);
    }

    #[test]
    fn display() {
        assert_eq!(AgentId(7).to_string(), "AgentId(7)");
    }
}

#[cfg(test)]
mod time {
    use crate::{SimClock, SimTime, Tick};

    #[test]
    fn clock_starts_at_start() {
        let clock = SimClock::new(SimTime::from_hms(6, 0, 0), 1.0);
        assert_eq!(clock.now(), SimTime(21_600.0));
        assert_eq!(clock.tick(), Tick::ZERO);
    }

    #[test]
    fn clock_advances_by_exact_steps() {
        let mut clock = SimClock::new(SimTime::ZERO, 0.1);
        for _ in 0..1_000 {
            clock.advance();
        }
        // Recomputed from the tick count, so no drift accumulates.
        assert_eq!(clock.now(), SimTime(1_000.0 * 0.1));
        assert_eq!(clock.tick(), Tick(1_000));
    }

    #[test]
    fn clock_reset() {
        let mut clock = SimClock::new(SimTime::ZERO, 5.0);
        clock.advance();
        clock.advance();
        clock.reset(SimTime(100.0));
        assert_eq!(clock.now(), SimTime(100.0));
        assert_eq!(clock.tick(), Tick::ZERO);
    }

    #[test]
    fn sim_time_is_totally_ordered() {
        let mut v = vec![SimTime(3.0), SimTime(-1.0), SimTime(2.5)];
        v.sort();
        assert_eq!(v, vec![SimTime(-1.0), SimTime(2.5), SimTime(3.0)]);
        assert_eq!(SimTime(1.0).max(SimTime(4.0)), SimTime(4.0));
    }

    #[test]
    fn sim_time_arithmetic() {
        let t = SimTime(10.0) + 5.5;
        assert_eq!(t, SimTime(15.5));
        assert_eq!(t - SimTime(10.0), 5.5);
        assert_eq!(t.since(SimTime(20.0)), -4.5);
    }

    #[test]
    fn display_hms() {
        assert_eq!(SimTime::from_hms(25, 3, 9).to_string(), "25:03:09");
        assert_eq!(SimTime(59.9).to_string(), "00:00:59");
    }
}

#[cfg(test)]
mod transport {
    use crate::{ModeSet, TransportMode};

    #[test]
    fn all_index_consistent() {
        for (i, m) in TransportMode::ALL.into_iter().enumerate() {
            assert_eq!(m.index(), i);
        }
    }

    #[test]
    fn parse_roundtrip() {
        for m in TransportMode::ALL {
            assert_eq!(m.as_str().parse::<TransportMode>().unwrap(), m);
        }
        assert!("hovercraft".parse::<TransportMode>().is_err());
    }

    #[test]
    fn mode_set_membership() {
        let set = ModeSet::of(&[TransportMode::Car, TransportMode::Bike]);
        assert!(set.contains(TransportMode::Car));
        assert!(set.contains(TransportMode::Bike));
        assert!(!set.contains(TransportMode::Walk));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![TransportMode::Car, TransportMode::Bike]);
        assert!(ModeSet::EMPTY.is_empty());
    }
}

#[cfg(test)]
mod geo {
    use crate::Coord;

    #[test]
    fn beeline() {
        let a = Coord::new(0.0, 0.0);
        let b = Coord::new(300.0, 400.0);
        assert_eq!(a.distance(b), 500.0);
        assert_eq!(a.distance(a), 0.0);
    }
}

#[cfg(test)]
mod rng {
    use crate::{AgentId, AgentRng};

    #[test]
    fn same_seed_same_stream() {
        let mut a = AgentRng::for_iteration(42, 3, AgentId(7));
        let mut b = AgentRng::for_iteration(42, 3, AgentId(7));
        let xs: Vec<u64> = (0..8).map(|_| a.random()).collect();
        let ys: Vec<u64> = (0..8).map(|_| b.random()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn iterations_and_agents_differ() {
        let x: u64 = AgentRng::for_iteration(42, 3, AgentId(7)).random();
        let y: u64 = AgentRng::for_iteration(42, 4, AgentId(7)).random();
        let z: u64 = AgentRng::for_iteration(42, 3, AgentId(8)).random();
        assert_ne!(x, y);
        assert_ne!(x, z);
    }

    #[test]
    fn choose_from_slices() {
        let mut rng = AgentRng::new(1, AgentId(0));
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
        assert_eq!(rng.choose(&[5u8]), Some(&5));
    }
}

#[cfg(test)]
mod config {
    use crate::{SimConfig, SimTime, StrategyKind, TeleportedModeParams, TransportMode};

    #[test]
    fn default_is_valid() {
        let cfg = SimConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.qsim.time_step_secs, 1.0);
        assert_eq!(cfg.qsim.end_time, Some(SimTime::from_hms(30, 0, 0)));
        assert!(cfg.qsim.is_network_mode(TransportMode::Car));
        assert!(cfg.routing.teleported(TransportMode::Walk).is_some());
        assert!(cfg.routing.teleported(TransportMode::Car).is_none());
    }

    #[test]
    fn rejects_zero_step() {
        let mut cfg = SimConfig::default();
        cfg.qsim.time_step_secs = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_end_before_start() {
        let mut cfg = SimConfig::default();
        cfg.qsim.start_time = SimTime(100.0);
        cfg.qsim.end_time = Some(SimTime(50.0));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_mode_in_both_engines() {
        let mut cfg = SimConfig::default();
        cfg.routing.teleported_modes.push(TeleportedModeParams {
            mode: TransportMode::Car,
            speed_mps: Some(10.0),
            beeline_distance_factor: 1.0,
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_inverted_iterations() {
        let mut cfg = SimConfig::default();
        cfg.controller.first_iteration = 5;
        cfg.controller.last_iteration = 4;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn innovative_strategies() {
        assert!(StrategyKind::ReRoute.is_innovative());
        assert!(StrategyKind::ChangeSingleLegMode.is_innovative());
        assert!(!StrategyKind::BestScore.is_innovative());
        assert!(!StrategyKind::KeepLastSelected.is_innovative());
    }
}
