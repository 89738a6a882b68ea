//! Streak service - consecutive workout days

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use crate::ports::FitnessRepository;

/// Only this many recent workouts are considered, capping the streak at 100
pub const STREAK_LOOKBACK: usize = 100;

pub struct StreakService {
    repository: Arc<dyn FitnessRepository>,
}

impl StreakService {
    pub fn new(repository: Arc<dyn FitnessRepository>) -> Self {
        Self { repository }
    }

    /// Current streak as of the local calendar day
    pub fn current_streak(&self, user_id: Uuid) -> u32 {
        self.current_streak_on(user_id, Local::now().date_naive())
    }

    /// Current streak as of `today`
    ///
    /// Persistence failures count as a broken streak rather than an error.
    pub fn current_streak_on(&self, user_id: Uuid, today: NaiveDate) -> u32 {
        match self
            .repository
            .get_workouts_before(user_id, end_of_day(today), STREAK_LOOKBACK)
        {
            Ok(workouts) => streak_from_dates(workouts.iter().map(|w| w.day()), today),
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "streak calculation failed, reporting 0");
                0
            }
        }
    }
}

/// Exclusive upper bound for workouts that count towards today's streak
pub(crate) fn end_of_day(today: NaiveDate) -> NaiveDateTime {
    (today + Duration::days(1)).and_time(NaiveTime::MIN)
}

/// Count consecutive days ending today or yesterday
///
/// Duplicate days count once. The walk anchors on today when it has a
/// workout, otherwise on yesterday, and stops at the first missing day.
pub fn streak_from_dates(dates: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = dates.into_iter().filter(|d| *d <= today).collect();
    if days.is_empty() {
        return 0;
    }

    let yesterday = today - Duration::days(1);
    let mut expected = if days.contains(&today) {
        today
    } else if days.contains(&yesterday) {
        yesterday
    } else {
        return 0;
    };

    let mut streak = 0;
    for day in days.iter().rev() {
        if *day > expected {
            continue;
        }
        if *day != expected {
            break;
        }
        streak += 1;
        expected -= Duration::days(1);
    }
    streak
}
