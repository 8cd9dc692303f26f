//! Unit tests for wh-schedule.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use wh_core::{GridPosition, Package, PackageId, RobotId, RobotState};

use crate::{HealthMonitor, TaskScheduler};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn p(x: u32, y: u32) -> GridPosition {
    GridPosition::new(x, y)
}

/// Package `id` at `pos`, created `age_secs` seconds before a fixed epoch.
fn pkg(id: u64, pos: GridPosition, age_secs: i64) -> Package {
    let epoch = Utc::now();
    Package::with_created_at(PackageId(id), pos, "standard", epoch - Duration::seconds(age_secs))
}

fn no_others() -> HashMap<RobotId, PackageId> {
    HashMap::new()
}

// ── TaskScheduler ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod scheduler_tests {
    use super::*;

    #[test]
    fn nearest_package_wins() {
        let mut s = TaskScheduler::default();
        let packages = vec![pkg(1, p(9, 9), 100), pkg(2, p(1, 1), 0)];
        let pick = s.select_job(RobotId(0), p(0, 0), RobotState::Idle, &packages, &no_others());
        assert_eq!(pick, Some(PackageId(2)));
        assert_eq!(s.pending_assignment(RobotId(0)), Some(PackageId(2)));
    }

    #[test]
    fn older_package_breaks_distance_tie() {
        let mut s = TaskScheduler::default();
        let packages = vec![pkg(1, p(2, 0), 5), pkg(2, p(0, 2), 50)];
        let pick = s.select_job(RobotId(0), p(0, 0), RobotState::Idle, &packages, &no_others());
        assert_eq!(pick, Some(PackageId(2)));
    }

    #[test]
    fn id_is_final_tie_break() {
        let now = Utc::now();
        let a = Package::with_created_at(PackageId(7), p(2, 0), "standard", now);
        let b = Package::with_created_at(PackageId(3), p(0, 2), "standard", now);
        let packages = vec![a, b];
        let mut s = TaskScheduler::default();
        let pick = s.select_job(RobotId(0), p(0, 0), RobotState::Idle, &packages, &no_others());
        assert_eq!(pick, Some(PackageId(3)));
    }

    #[test]
    fn selection_is_deterministic() {
        let packages = vec![pkg(1, p(3, 3), 10), pkg(2, p(4, 2), 10), pkg(3, p(1, 5), 20)];
        let first = TaskScheduler::default()
            .select_job(RobotId(0), p(2, 2), RobotState::Idle, &packages, &no_others());
        for _ in 0..10 {
            let again = TaskScheduler::default()
                .select_job(RobotId(0), p(2, 2), RobotState::Idle, &packages, &no_others());
            assert_eq!(again, first);
        }
    }

    #[test]
    fn busy_robot_gets_nothing() {
        let mut s = TaskScheduler::default();
        let packages = vec![pkg(1, p(1, 1), 0)];
        for state in [RobotState::Fetching, RobotState::Delivering, RobotState::Faulted] {
            assert_eq!(s.select_job(RobotId(0), p(0, 0), state, &packages, &no_others()), None);
        }
        assert!(s.is_empty());
    }

    #[test]
    fn non_queued_packages_skipped() {
        let mut s = TaskScheduler::default();
        let mut taken = pkg(1, p(1, 1), 0);
        taken.assign(RobotId(5)).unwrap();
        let packages = vec![taken];
        assert_eq!(s.select_job(RobotId(0), p(0, 0), RobotState::Idle, &packages, &no_others()), None);
    }

    #[test]
    fn batch_and_pending_claims_are_respected() {
        let mut s = TaskScheduler::default();
        let packages = vec![pkg(1, p(1, 0), 0), pkg(2, p(5, 0), 0), pkg(3, p(9, 0), 0)];

        // Robot 0 claims the nearest package internally.
        assert_eq!(
            s.select_job(RobotId(0), p(0, 0), RobotState::Idle, &packages, &no_others()),
            Some(PackageId(1))
        );
        // Robot 1 at the same spot skips robot 0's pending package and the
        // one named in the caller's batch map.
        let batch = HashMap::from([(RobotId(9), PackageId(2))]);
        assert_eq!(
            s.select_job(RobotId(1), p(0, 0), RobotState::Idle, &packages, &batch),
            Some(PackageId(3))
        );
    }

    #[test]
    fn wait_cycles_reach_deadlock_threshold() {
        let mut s = TaskScheduler::new(3);
        let packages = vec![pkg(1, p(4, 4), 0)];
        s.select_job(RobotId(0), p(0, 0), RobotState::Idle, &packages, &no_others());

        for _ in 0..2 {
            s.record_robot_state(RobotId(0), p(0, 0), RobotState::Fetching);
        }
        assert!(s.detect_deadlocks().is_empty());
        s.record_robot_state(RobotId(0), p(0, 0), RobotState::Fetching);
        assert_eq!(s.detect_deadlocks(), vec![RobotId(0)]);
    }

    #[test]
    fn movement_resets_wait_cycles() {
        let mut s = TaskScheduler::new(2);
        let packages = vec![pkg(1, p(4, 4), 0)];
        s.select_job(RobotId(0), p(0, 0), RobotState::Idle, &packages, &no_others());
        s.record_robot_state(RobotId(0), p(0, 0), RobotState::Fetching);
        s.record_robot_state(RobotId(0), p(0, 1), RobotState::Fetching);
        s.record_robot_state(RobotId(0), p(0, 1), RobotState::Fetching);
        assert!(s.detect_deadlocks().is_empty());
        assert_eq!(s.record(RobotId(0)).map(|r| r.wait_cycles), Some(1));
    }

    #[test]
    fn going_idle_drops_record() {
        let mut s = TaskScheduler::default();
        let packages = vec![pkg(1, p(4, 4), 0)];
        s.select_job(RobotId(0), p(0, 0), RobotState::Idle, &packages, &no_others());
        s.record_robot_state(RobotId(0), p(4, 4), RobotState::Idle);
        assert_eq!(s.pending_assignment(RobotId(0)), None);
    }

    #[test]
    fn unknown_robot_is_ignored() {
        let mut s = TaskScheduler::new(1);
        s.record_robot_state(RobotId(3), p(0, 0), RobotState::Fetching);
        s.record_robot_state(RobotId(3), p(0, 0), RobotState::Fetching);
        assert!(s.detect_deadlocks().is_empty());
    }
}

// ── HealthMonitor ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod health_tests {
    use super::*;

    #[test]
    fn first_observation_is_baseline() {
        let mut h = HealthMonitor::new(2);
        let status = h.observe(RobotId(0), p(1, 1), RobotState::Fetching);
        assert_eq!(status.stalled_ticks, 0);
        assert!(!status.faulted);
    }

    #[test]
    fn working_robot_stalls_into_fault() {
        let mut h = HealthMonitor::new(2);
        h.observe(RobotId(0), p(1, 1), RobotState::Fetching);
        assert!(!h.observe(RobotId(0), p(1, 1), RobotState::Fetching).faulted);
        assert!(h.observe(RobotId(0), p(1, 1), RobotState::Fetching).faulted);
    }

    #[test]
    fn idle_and_faulted_never_stall() {
        let mut h = HealthMonitor::new(1);
        h.observe(RobotId(0), p(1, 1), RobotState::Idle);
        for _ in 0..5 {
            h.observe(RobotId(0), p(1, 1), RobotState::Idle);
            h.observe(RobotId(0), p(1, 1), RobotState::Faulted);
        }
        assert_eq!(h.status(RobotId(0)).map(|s| s.stalled_ticks), Some(0));
    }

    #[test]
    fn movement_clears_stall() {
        let mut h = HealthMonitor::new(2);
        h.observe(RobotId(0), p(1, 1), RobotState::Delivering);
        h.observe(RobotId(0), p(1, 1), RobotState::Delivering);
        h.observe(RobotId(0), p(1, 1), RobotState::Delivering);
        let status = h.observe(RobotId(0), p(2, 1), RobotState::Delivering);
        assert_eq!(status.stalled_ticks, 0);
        assert!(!status.faulted);
    }

    #[test]
    fn clear_fault_resets() {
        let mut h = HealthMonitor::new(1);
        h.observe(RobotId(0), p(1, 1), RobotState::Fetching);
        h.observe(RobotId(0), p(1, 1), RobotState::Fetching);
        h.clear_fault(RobotId(0));
        let status = h.status(RobotId(0)).unwrap();
        assert!(!status.faulted);
        assert_eq!(status.stalled_ticks, 0);
        assert_eq!(h.statuses().count(), 1);
    }
}
