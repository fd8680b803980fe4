//! Focus statistics computed from recorded sessions.
//!
//! All day bucketing uses the UTC calendar date a session started on. Only
//! work sessions count
//! toward focus time; a completed pomodoro is a work session that ran to
//! zero (skipped and reset sessions are excluded).

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::Serialize;

use crate::recorder::SessionRecord;
use crate::settings::Settings;

/// Totals for one calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayTotals {
    pub completed_pomodoros: u32,
    pub focus_seconds: u64,
}

/// Weekday with the most focused time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BusiestDay {
    pub weekday: Weekday,
    pub minutes: u64,
}

/// Progress toward a pomodoro goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GoalProgress {
    pub completed: u32,
    pub goal: u32,
}

impl GoalProgress {
    pub fn is_met(&self) -> bool {
        self.completed >= self.goal
    }

    /// Completion percentage, capped at 100.
    pub fn percent(&self) -> u32 {
        if self.goal == 0 {
            return 100;
        }
        (self.completed.saturating_mul(100) / self.goal).min(100)
    }
}

/// Aggregate statistics over a set of sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FocusSummary {
    pub total_focus_seconds: u64,
    pub completed_pomodoros: u32,
    pub average_session_minutes: u32,
    pub busiest_day: Option<BusiestDay>,
    pub current_streak_days: u32,
    pub daily: BTreeMap<NaiveDate, DayTotals>,
    pub today: GoalProgress,
    pub this_week: GoalProgress,
}

impl FocusSummary {
    /// Computes the summary over every record as of `today`.
    pub fn compute(records: &[SessionRecord], settings: &Settings, today: NaiveDate) -> Self {
        Self::compute_since(records, settings, today, None)
    }

    /// Computes the summary as of `today`, with totals limited to sessions
    /// started at or after `since`.
    ///
    /// Goal progress and the streak always look at the full history so a
    /// short window cannot hide pomodoros from this week.
    pub fn compute_since(
        records: &[SessionRecord],
        settings: &Settings,
        today: NaiveDate,
        since: Option<DateTime<Utc>>,
    ) -> Self {
        let all_days = group_by_day(records);
        let week_start = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        let week_completed = all_days
            .range(week_start..=today)
            .map(|(_, totals)| totals.completed_pomodoros)
            .sum();
        let today_completed = all_days
            .get(&today)
            .map(|totals| totals.completed_pomodoros)
            .unwrap_or(0);

        let window: Vec<SessionRecord> = match since {
            Some(since) => records
                .iter()
                .filter(|r| r.start_time >= since)
                .cloned()
                .collect(),
            None => records.to_vec(),
        };

        Self {
            total_focus_seconds: total_focus_seconds(&window),
            completed_pomodoros: completed_pomodoros(&window),
            average_session_minutes: average_session_minutes(&window),
            busiest_day: busiest_day(&window),
            current_streak_days: current_streak(records, today),
            daily: group_by_day(&window),
            today: GoalProgress {
                completed: today_completed,
                goal: settings.daily_goal,
            },
            this_week: GoalProgress {
                completed: week_completed,
                goal: settings.weekly_goal,
            },
        }
    }
}

fn focus_seconds(record: &SessionRecord) -> u64 {
    if record.is_break || record.is_open() {
        return 0;
    }
    match record.duration_seconds {
        Some(seconds) => u64::from(seconds),
        None => record
            .end_time
            .map(|end| (end - record.start_time).num_seconds().max(0) as u64)
            .unwrap_or(0),
    }
}

/// Total seconds of closed work sessions, including skipped ones.
pub fn total_focus_seconds(records: &[SessionRecord]) -> u64 {
    records.iter().map(focus_seconds).sum()
}

/// Number of work sessions that ran to completion.
pub fn completed_pomodoros(records: &[SessionRecord]) -> u32 {
    records.iter().filter(|r| r.is_completed_pomodoro()).count() as u32
}

/// Average length of completed pomodoros in whole minutes (rounded).
pub fn average_session_minutes(records: &[SessionRecord]) -> u32 {
    let durations: Vec<u64> = records
        .iter()
        .filter(|r| r.is_completed_pomodoro())
        .filter_map(|r| r.duration_seconds.map(u64::from))
        .collect();
    if durations.is_empty() {
        return 0;
    }

    let total: u64 = durations.iter().sum();
    let count = durations.len() as u64;
    // Round half up
    ((total + count * 30) / (count * 60)) as u32
}

/// Groups work sessions by the UTC date they started on.
pub fn group_by_day(records: &[SessionRecord]) -> BTreeMap<NaiveDate, DayTotals> {
    let mut days: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();
    for record in records.iter().filter(|r| !r.is_break) {
        let totals = days.entry(record.start_time.date_naive()).or_default();
        totals.focus_seconds += focus_seconds(record);
        if record.is_completed_pomodoro() {
            totals.completed_pomodoros += 1;
        }
    }
    days
}

/// Weekday with the most focused time, if any focus was recorded.
///
/// Ties go to the earliest weekday starting from Monday.
pub fn busiest_day(records: &[SessionRecord]) -> Option<BusiestDay> {
    let mut totals = [0u64; 7];
    for record in records {
        let seconds = focus_seconds(record);
        if seconds > 0 {
            totals[record.start_time.weekday().num_days_from_monday() as usize] += seconds;
        }
    }

    let (index, seconds) = totals
        .iter()
        .enumerate()
        .filter(|(_, seconds)| **seconds > 0)
        .fold(None, |best: Option<(usize, u64)>, (i, s)| match best {
            Some((_, best_s)) if best_s >= *s => best,
            _ => Some((i, *s)),
        })?;

    Some(BusiestDay {
        weekday: weekday_from_monday(index),
        minutes: (seconds + 30) / 60,
    })
}

fn weekday_from_monday(index: usize) -> Weekday {
    match index {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}

/// Consecutive days with at least one completed pomodoro.
///
/// The streak counts back from today, or from yesterday when nothing has
/// been completed yet today.
pub fn current_streak(records: &[SessionRecord], today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = records
        .iter()
        .filter(|r| r.is_completed_pomodoro())
        .map(|r| r.start_time.date_naive())
        .collect();

    let mut day = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while days.contains(&day) {
        streak += 1;
        day = day - Duration::days(1);
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::StopReason;
    use crate::types::TimerMode;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        // 2026-03-02 is a Monday
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn session(
        start: DateTime<Utc>,
        mode: TimerMode,
        seconds: u32,
        reason: StopReason,
    ) -> SessionRecord {
        SessionRecord {
            id: Uuid::new_v4(),
            task_id: None,
            mode,
            start_time: start,
            end_time: Some(start + Duration::seconds(i64::from(seconds))),
            duration_seconds: Some(seconds),
            is_break: mode.is_break(),
            skipped: reason.is_skipped(),
            stop_reason: Some(reason),
            notes: None,
        }
    }

    fn pomodoro(day: u32, hour: u32) -> SessionRecord {
        session(at(day, hour), TimerMode::Work, 1500, StopReason::Completed)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()
    }

    #[test]
    fn test_empty_records() {
        let summary = FocusSummary::compute(&[], &Settings::default(), today());
        assert_eq!(summary.total_focus_seconds, 0);
        assert_eq!(summary.completed_pomodoros, 0);
        assert_eq!(summary.average_session_minutes, 0);
        assert_eq!(summary.busiest_day, None);
        assert_eq!(summary.current_streak_days, 0);
        assert!(summary.daily.is_empty());
    }

    #[test]
    fn test_breaks_excluded_from_focus() {
        let records = vec![
            pomodoro(2, 9),
            session(at(2, 10), TimerMode::ShortBreak, 300, StopReason::Completed),
        ];
        assert_eq!(total_focus_seconds(&records), 1500);
        assert_eq!(completed_pomodoros(&records), 1);
    }

    #[test]
    fn test_skipped_counts_time_but_not_pomodoros() {
        let records = vec![
            pomodoro(2, 9),
            session(at(2, 10), TimerMode::Work, 600, StopReason::Skipped),
        ];
        assert_eq!(total_focus_seconds(&records), 2100);
        assert_eq!(completed_pomodoros(&records), 1);
        assert_eq!(average_session_minutes(&records), 25);
    }

    #[test]
    fn test_open_session_ignored() {
        let mut open = pomodoro(2, 9);
        open.end_time = None;
        open.duration_seconds = None;
        open.stop_reason = None;
        assert_eq!(total_focus_seconds(&[open]), 0);
    }

    #[test]
    fn test_average_rounds() {
        let records = vec![
            session(at(2, 9), TimerMode::Work, 600, StopReason::Completed),
            session(at(2, 10), TimerMode::Work, 1290, StopReason::Completed),
        ];
        // (10 + 21.5) / 2 = 15.75 minutes
        assert_eq!(average_session_minutes(&records), 16);
    }

    #[test]
    fn test_group_by_day() {
        let records = vec![pomodoro(2, 9), pomodoro(2, 11), pomodoro(3, 9)];
        let days = group_by_day(&records);
        assert_eq!(days.len(), 2);
        let monday = days[&NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()];
        assert_eq!(monday.completed_pomodoros, 2);
        assert_eq!(monday.focus_seconds, 3000);
    }

    #[test]
    fn test_busiest_day() {
        let records = vec![pomodoro(2, 9), pomodoro(4, 9), pomodoro(4, 11)];
        let busiest = busiest_day(&records).unwrap();
        assert_eq!(busiest.weekday, Weekday::Wed);
        assert_eq!(busiest.minutes, 50);
    }

    #[test]
    fn test_streak_including_today() {
        let records = vec![pomodoro(3, 9), pomodoro(4, 9), pomodoro(5, 9)];
        assert_eq!(current_streak(&records, today()), 3);
    }

    #[test]
    fn test_streak_from_yesterday() {
        let records = vec![pomodoro(3, 9), pomodoro(4, 9)];
        assert_eq!(current_streak(&records, today()), 2);
    }

    #[test]
    fn test_streak_broken() {
        let records = vec![pomodoro(2, 9), pomodoro(5, 9)];
        assert_eq!(current_streak(&records, today()), 1);

        let stale = vec![pomodoro(2, 9)];
        assert_eq!(current_streak(&stale, today()), 0);
    }

    #[test]
    fn test_goal_progress() {
        let records = vec![pomodoro(2, 9), pomodoro(5, 9), pomodoro(5, 10)];
        let settings = Settings {
            daily_goal: 2,
            weekly_goal: 4,
            ..Default::default()
        };

        let summary = FocusSummary::compute(&records, &settings, today());

        assert_eq!(summary.today.completed, 2);
        assert!(summary.today.is_met());
        assert_eq!(summary.this_week.completed, 3);
        assert_eq!(summary.this_week.percent(), 75);
        assert!(!summary.this_week.is_met());
    }

    #[test]
    fn test_previous_week_excluded_from_weekly_goal() {
        let last_sunday = session(
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            TimerMode::Work,
            1500,
            StopReason::Completed,
        );
        let summary = FocusSummary::compute(&[last_sunday], &Settings::default(), today());
        assert_eq!(summary.this_week.completed, 0);
    }

    #[test]
    fn test_pomodoro_across_midnight_counts_once_for_start_day() {
        // 2026-03-04 23:50 to 2026-03-05 00:15
        let late = session(
            Utc.with_ymd_and_hms(2026, 3, 4, 23, 50, 0).unwrap(),
            TimerMode::Work,
            1500,
            StopReason::Completed,
        );
        let summary = FocusSummary::compute(&[late], &Settings::default(), today());

        assert_eq!(summary.today.completed, 0);
        assert_eq!(summary.this_week.completed, 1);
        // Counted for yesterday, so the streak still stands
        assert_eq!(summary.current_streak_days, 1);
        assert!(summary
            .daily
            .contains_key(&NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()));
    }

    #[test]
    fn test_streak_and_goal_agree_on_day() {
        let records = vec![pomodoro(4, 9), pomodoro(5, 9)];
        let summary = FocusSummary::compute(&records, &Settings::default(), today());
        assert_eq!(summary.today.completed, 1);
        assert_eq!(summary.current_streak_days, 2);
    }

    #[test]
    fn test_window_limits_totals_only() {
        let records = vec![pomodoro(2, 9), pomodoro(3, 9), pomodoro(5, 9)];
        let settings = Settings {
            daily_goal: 1,
            weekly_goal: 4,
            ..Default::default()
        };

        let summary = FocusSummary::compute_since(&records, &settings, today(), Some(at(5, 0)));

        assert_eq!(summary.completed_pomodoros, 1);
        assert_eq!(summary.total_focus_seconds, 1500);
        assert_eq!(summary.daily.len(), 1);
        assert_eq!(summary.busiest_day.map(|d| d.weekday), Some(Weekday::Thu));
        // Goals and streak still see the whole week
        assert_eq!(summary.today.completed, 1);
        assert_eq!(summary.this_week.completed, 3);
        assert_eq!(summary.current_streak_days, 1);
    }

    #[test]
    fn test_no_window_matches_compute() {
        let records = vec![pomodoro(2, 9), pomodoro(5, 9)];
        let settings = Settings::default();
        assert_eq!(
            FocusSummary::compute_since(&records, &settings, today(), None),
            FocusSummary::compute(&records, &settings, today())
        );
    }
}
