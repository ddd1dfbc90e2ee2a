use serde::{Deserialize, Serialize};

use crate::core::Clock;
use crate::errors::{DiffJuneError, Result};

const HOURS_PER_DAY: f64 = 24.;
const DAYS_PER_WEEK: usize = 7;
const FIRST_WEEKEND_DAY: usize = 5;

/// Daily step plan of a `Timer`.
///
/// Step durations are given in hours and must add up to a full day. Each step lists the venue
/// types that are active during it. Weekdays are counted from Monday (`0`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimerConfig {
    pub total_days: usize,

    #[serde(default)]
    pub initial_weekday: usize,

    pub weekday_step_durations: Vec<f64>,

    pub weekday_activities: Vec<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekend_step_durations: Option<Vec<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekend_activities: Option<Vec<Vec<String>>>,
}

impl TimerConfig {
    /// One 24 hour step per day with the same activities every day.
    pub fn daily(total_days: usize, activities: &[&str]) -> Self {
        Self {
            total_days,
            initial_weekday: 0,
            weekday_step_durations: vec![HOURS_PER_DAY],
            weekday_activities: vec![activities.iter().map(|a| a.to_string()).collect()],
            weekend_step_durations: None,
            weekend_activities: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.initial_weekday >= DAYS_PER_WEEK {
            return Err(DiffJuneError::ScheduleError(format!(
                "initial weekday must be below {DAYS_PER_WEEK}, got {}",
                self.initial_weekday
            )));
        }
        validate_day("weekday", &self.weekday_step_durations, &self.weekday_activities)?;
        match (&self.weekend_step_durations, &self.weekend_activities) {
            (Some(durations), Some(activities)) => validate_day("weekend", durations, activities),
            (None, None) => Ok(()),
            _ => Err(DiffJuneError::ScheduleError(
                "weekend step durations and activities must be given together".to_string(),
            )),
        }
    }
}

fn validate_day(label: &str, durations: &[f64], activities: &[Vec<String>]) -> Result<()> {
    if durations.is_empty() {
        return Err(DiffJuneError::ScheduleError(format!(
            "{label} needs at least one step"
        )));
    }
    if durations.len() != activities.len() {
        return Err(DiffJuneError::ScheduleError(format!(
            "{label} has {} step durations but {} activity lists",
            durations.len(),
            activities.len()
        )));
    }
    if let Some(duration) = durations.iter().find(|d| !(d.is_finite() && **d > 0.)) {
        return Err(DiffJuneError::ScheduleError(format!(
            "{label} step duration must be positive, got {duration}"
        )));
    }
    let total: f64 = durations.iter().sum();
    if (total - HOURS_PER_DAY).abs() > 1e-9 {
        return Err(DiffJuneError::ScheduleError(format!(
            "{label} step durations add up to {total} hours instead of {HOURS_PER_DAY}"
        )));
    }
    Ok(())
}

/// Clock stepping through days according to a `TimerConfig`.
#[derive(Clone, Debug, PartialEq)]
pub struct Timer {
    config: TimerConfig,
    day: usize,
    shift: usize,
    now: f64,
}

impl Timer {
    pub fn new(config: TimerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            day: 0,
            shift: 0,
            now: 0.,
        })
    }

    pub fn day(&self) -> usize {
        self.day
    }

    pub fn shift(&self) -> usize {
        self.shift
    }

    pub fn is_weekend(&self) -> bool {
        (self.config.initial_weekday + self.day) % DAYS_PER_WEEK >= FIRST_WEEKEND_DAY
    }

    /// Restart from the first step.
    pub fn reset(&mut self) {
        self.day = 0;
        self.shift = 0;
        self.now = 0.;
    }

    fn schedule(&self) -> (&[f64], &[Vec<String>]) {
        match (
            self.is_weekend(),
            &self.config.weekend_step_durations,
            &self.config.weekend_activities,
        ) {
            (true, Some(durations), Some(activities)) => {
                (durations.as_slice(), activities.as_slice())
            }
            _ => (
                self.config.weekday_step_durations.as_slice(),
                self.config.weekday_activities.as_slice(),
            ),
        }
    }
}

impl Clock for Timer {
    fn now(&self) -> f64 {
        self.now
    }

    fn duration(&self) -> f64 {
        let (durations, _) = self.schedule();
        durations[self.shift] / HOURS_PER_DAY
    }

    fn activities(&self) -> &[String] {
        let (_, activities) = self.schedule();
        &activities[self.shift]
    }

    fn is_finished(&self) -> bool {
        self.day >= self.config.total_days
    }

    fn advance(&mut self) {
        if self.is_finished() {
            return;
        }
        let (durations, _) = self.schedule();
        let n_shifts = durations.len();
        self.shift += 1;
        if self.shift == n_shifts {
            self.shift = 0;
            self.day += 1;
            self.now = self.day as f64;
        } else {
            let (durations, _) = self.schedule();
            let elapsed: f64 = durations[..self.shift].iter().sum();
            self.now = self.day as f64 + elapsed / HOURS_PER_DAY;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn weekly_config() -> TimerConfig {
        TimerConfig {
            total_days: 7,
            initial_weekday: 4,
            weekday_step_durations: vec![8., 16.],
            weekday_activities: vec![
                vec!["school".to_string(), "company".to_string()],
                vec!["household".to_string()],
            ],
            weekend_step_durations: Some(vec![24.]),
            weekend_activities: Some(vec![vec!["leisure".to_string()]]),
        }
    }

    #[test]
    fn daily_timer_steps_whole_days() {
        let mut timer = Timer::new(TimerConfig::daily(3, &["school"])).unwrap();
        let mut times = Vec::new();
        while !timer.is_finished() {
            assert_eq!(timer.duration(), 1.);
            assert_eq!(timer.activities(), &["school".to_string()]);
            times.push(timer.now());
            timer.advance();
        }
        assert_eq!(times, vec![0., 1., 2.]);
        assert_eq!(timer.now(), 3.);
    }

    #[test]
    fn shifts_within_a_day() {
        let mut timer = Timer::new(weekly_config()).unwrap();
        // Friday
        assert!(!timer.is_weekend());
        assert_relative_eq!(timer.duration(), 1. / 3.);
        timer.advance();
        assert_relative_eq!(timer.now(), 1. / 3.);
        assert_relative_eq!(timer.duration(), 2. / 3.);
        assert_eq!(timer.activities(), &["household".to_string()]);
        timer.advance();
        // Saturday
        assert_eq!(timer.now(), 1.);
        assert!(timer.is_weekend());
        assert_eq!(timer.duration(), 1.);
        assert_eq!(timer.activities(), &["leisure".to_string()]);
    }

    #[test]
    fn finishes_after_total_days() {
        let mut timer = Timer::new(weekly_config()).unwrap();
        let mut n_steps = 0;
        while !timer.is_finished() {
            timer.advance();
            n_steps += 1;
        }
        // Fri, Mon-Thu with two steps; Sat, Sun with one
        assert_eq!(n_steps, 5 * 2 + 2);
        timer.advance();
        assert_eq!(timer.day(), 7);
        timer.reset();
        assert_eq!(timer.now(), 0.);
        assert_eq!(timer.shift(), 0);
    }

    #[test]
    fn durations_must_fill_a_day() {
        let mut config = TimerConfig::daily(1, &["school"]);
        config.weekday_step_durations = vec![12.];
        assert!(Timer::new(config).is_err());
    }

    #[test]
    fn activities_must_match_durations() {
        let mut config = weekly_config();
        config.weekday_activities.pop();
        assert!(Timer::new(config).is_err());

        let mut config = weekly_config();
        config.weekend_activities = None;
        assert!(Timer::new(config).is_err());
    }
}
