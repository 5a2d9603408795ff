use chrono::{DateTime, Utc};

use crate::cycles::Cycle;

/// Whole seconds since the cycle started, clamped to its total duration so
/// a wall-clock jump never yields a negative remainder.
pub fn elapsed_seconds(cycle: &Cycle, now: DateTime<Utc>) -> i64 {
    let elapsed = (now - cycle.start).num_seconds();
    elapsed.clamp(0, cycle.total_seconds())
}

pub fn remaining_seconds(cycle: &Cycle, now: DateTime<Utc>) -> i64 {
    cycle.total_seconds() - elapsed_seconds(cycle, now)
}

pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn cycle_started_at(minutes_amount: u32, start: DateTime<Utc>) -> Cycle {
        Cycle {
            id: "cycle-test-0".to_string(),
            task: "Study".to_string(),
            minutes_amount,
            start,
            interrupted_at: None,
            finished_at: None,
        }
    }

    #[test]
    fn one_minute_cycle_reaches_zero_after_sixty_seconds() {
        let start = Utc::now();
        let cycle = cycle_started_at(1, start);
        for tick in 0..=60 {
            let now = start + Duration::seconds(tick);
            assert_eq!(remaining_seconds(&cycle, now), 60 - tick);
        }
        assert_eq!(format_clock(remaining_seconds(&cycle, start + Duration::seconds(60))), "00:00");
    }

    #[test]
    fn elapsed_clamps_past_the_total_duration() {
        let start = Utc::now();
        let cycle = cycle_started_at(1, start);
        let late = start + Duration::seconds(500);
        assert_eq!(elapsed_seconds(&cycle, late), 60);
        assert_eq!(remaining_seconds(&cycle, late), 0);
    }

    #[test]
    fn elapsed_clamps_before_the_start() {
        let start = Utc::now();
        let cycle = cycle_started_at(25, start);
        let early = start - Duration::seconds(10);
        assert_eq!(elapsed_seconds(&cycle, early), 0);
        assert_eq!(remaining_seconds(&cycle, early), 25 * 60);
    }

    #[test]
    fn clock_formats_minutes_and_seconds() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(9), "00:09");
        assert_eq!(format_clock(75), "01:15");
        assert_eq!(format_clock(25 * 60), "25:00");
        assert_eq!(format_clock(60 * 60), "60:00");
        assert_eq!(format_clock(-5), "00:00");
    }
}
