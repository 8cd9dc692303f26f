//! Unit tests for wh-core primitives.

#[cfg(test)]
mod ids {
    use crate::{PackageId, RobotId};

    #[test]
    fn index_roundtrip() {
        let id = RobotId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(RobotId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(RobotId(0) < RobotId(1));
        assert!(PackageId(100) > PackageId(99));
    }

    #[test]
    fn display() {
        assert_eq!(RobotId(7).to_string(), "AGV-7");
        assert_eq!(PackageId(12).to_string(), "PKG-12");
    }
}

#[cfg(test)]
mod grid {
    use crate::{GridBounds, GridPosition};

    #[test]
    fn manhattan_is_symmetric() {
        let a = GridPosition::new(0, 0);
        let b = GridPosition::new(1, 5);
        assert_eq!(a.manhattan(b), 6);
        assert_eq!(b.manhattan(a), 6);
    }

    #[test]
    fn corner_has_two_neighbors() {
        let bounds = GridBounds::new(5, 5);
        let n: Vec<_> = GridPosition::new(0, 0).neighbors(bounds).collect();
        assert_eq!(n, vec![GridPosition::new(0, 1), GridPosition::new(1, 0)]);
    }

    #[test]
    fn interior_neighbor_order_is_fixed() {
        let bounds = GridBounds::new(5, 5);
        let n: Vec<_> = GridPosition::new(2, 2).neighbors(bounds).collect();
        assert_eq!(
            n,
            vec![
                GridPosition::new(2, 3),
                GridPosition::new(2, 1),
                GridPosition::new(3, 2),
                GridPosition::new(1, 2),
            ]
        );
    }

    #[test]
    fn far_edge_is_excluded() {
        let bounds = GridBounds::new(3, 3);
        assert!(!bounds.contains(GridPosition::new(3, 0)));
        assert!(GridPosition::new(2, 2).neighbors(bounds).all(|p| bounds.contains(p)));
    }
}

#[cfg(test)]
mod layout {
    use crate::{CoreError, GridPosition, WarehouseLayout};

    fn layout() -> WarehouseLayout {
        let mut l = WarehouseLayout::new(20, 15, 40);
        l.pickup_zones = vec![GridPosition::new(1, 5)];
        l.dropoff_zones = vec![GridPosition::new(18, 5), GridPosition::new(18, 9)];
        l
    }

    #[test]
    fn valid_layout_passes() {
        assert!(layout().validate().is_ok());
    }

    #[test]
    fn zone_outside_grid_rejected() {
        let mut l = layout();
        l.dropoff_zones.push(GridPosition::new(20, 0));
        assert!(matches!(l.validate(), Err(CoreError::OutOfBounds { .. })));
    }

    #[test]
    fn zone_on_obstacle_rejected() {
        let mut l = layout();
        l.obstacles.insert(GridPosition::new(1, 5));
        assert!(matches!(l.validate(), Err(CoreError::Layout(_))));
    }

    #[test]
    fn missing_pickup_rejected() {
        let mut l = layout();
        l.pickup_zones.clear();
        assert!(l.validate().is_err());
    }

    #[test]
    fn nearest_dropoff_by_manhattan() {
        let l = layout();
        assert_eq!(l.nearest_dropoff(GridPosition::new(17, 8)), Some(GridPosition::new(18, 9)));
        assert_eq!(l.nearest_dropoff(GridPosition::new(0, 0)), Some(GridPosition::new(18, 5)));
    }
}

#[cfg(test)]
mod package {
    use crate::{CoreError, GridPosition, Package, PackageId, PackageStatus, RobotId};

    fn pkg() -> Package {
        Package::new(PackageId(1), GridPosition::new(1, 5), "standard")
    }

    #[test]
    fn full_lifecycle() {
        let mut p = pkg();
        assert_eq!(p.status(), PackageStatus::Queued);
        p.assign(RobotId(0)).unwrap();
        assert_eq!(p.assigned_robot(), Some(RobotId(0)));
        p.pick_up().unwrap();
        p.deliver().unwrap();
        assert_eq!(p.status(), PackageStatus::Delivered);
    }

    #[test]
    fn skipping_a_step_is_rejected() {
        let mut p = pkg();
        let err = p.pick_up().unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidPackageTransition {
                from: PackageStatus::Queued,
                to:   PackageStatus::InTransit,
                ..
            }
        ));
        assert_eq!(p.status(), PackageStatus::Queued);
    }

    #[test]
    fn double_assign_is_rejected() {
        let mut p = pkg();
        p.assign(RobotId(0)).unwrap();
        assert!(p.assign(RobotId(1)).is_err());
        assert_eq!(p.assigned_robot(), Some(RobotId(0)));
    }

    #[test]
    fn requeue_clears_robot() {
        let mut p = pkg();
        p.assign(RobotId(3)).unwrap();
        p.pick_up().unwrap();
        p.requeue().unwrap();
        assert_eq!(p.status(), PackageStatus::Queued);
        assert_eq!(p.assigned_robot(), None);
    }

    #[test]
    fn delivered_cannot_requeue() {
        let mut p = pkg();
        p.assign(RobotId(0)).unwrap();
        p.pick_up().unwrap();
        p.deliver().unwrap();
        assert!(p.requeue().is_err());
    }
}

#[cfg(test)]
mod reservation {
    use chrono::{Duration, Utc};

    use crate::{GridPosition, Reservation, RobotId};

    #[test]
    fn expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let r = Reservation::new(RobotId(0), GridPosition::new(2, 3), now, 3);
        assert!(!r.is_expired(now));
        assert!(!r.is_expired(now + Duration::milliseconds(2_999)));
        assert!(r.is_expired(now + Duration::seconds(3)));
    }
}

#[cfg(test)]
mod rng {
    use crate::SimRng;

    #[test]
    fn same_seed_same_stream() {
        let mut a = SimRng::new(7);
        let mut b = SimRng::new(7);
        let xs: Vec<f64> = (0..16).map(|_| a.unit()).collect();
        let ys: Vec<f64> = (0..16).map(|_| b.unit()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn weighted_skips_zero_weights() {
        let mut rng = SimRng::new(1);
        let keys = ["standard".to_string(), "express".to_string()];
        for _ in 0..50 {
            let pick = rng.weighted([(&keys[0], 0.0), (&keys[1], 1.0)]);
            assert_eq!(pick, Some(&keys[1]));
        }
        assert_eq!(rng.weighted([(&keys[0], 0.0)]), None);
    }

    #[test]
    fn gen_bool_clamps() {
        let mut rng = SimRng::new(3);
        assert!(rng.gen_bool(2.0));
        assert!(!rng.gen_bool(-1.0));
    }
}
