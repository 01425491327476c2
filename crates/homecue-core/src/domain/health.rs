//! House-health scoring.
//!
//! The score is a weighted average of completion rates, one per frequency
//! bucket. Monthly and quarterly tasks share a bucket; seasonal tasks only
//! count when due in the current season.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::frequency::Frequency;
use super::ids::UserId;
use super::state::TaskStatus;
use super::task::Task;

const DAILY_WEIGHT: f64 = 0.15;
const WEEKLY_WEIGHT: f64 = 0.20;
const MONTHLY_WEIGHT: f64 = 0.25;
const SEASONAL_WEIGHT: f64 = 0.25;
const ANNUAL_WEIGHT: f64 = 0.15;

/// Category scores below this get a recommendation.
const RECOMMENDATION_THRESHOLD: u8 = 70;
const MAX_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    /// Meteorological season of `at` (Mar–May spring, Jun–Aug summer,
    /// Sep–Nov fall, Dec–Feb winter).
    pub fn of(at: DateTime<Utc>) -> Self {
        match at.month() {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Fall,
            _ => Season::Winter,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
            Season::Winter => "winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseHealthScore {
    pub user_id: UserId,
    pub overall_score: u8,
    pub daily_score: u8,
    pub weekly_score: u8,
    pub monthly_score: u8,
    pub seasonal_score: u8,
    pub annual_score: u8,
    pub last_calculated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    NeedsAttention,
    Critical,
}

impl HealthStatus {
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => HealthStatus::Excellent,
            75..=89 => HealthStatus::Good,
            60..=74 => HealthStatus::Fair,
            40..=59 => HealthStatus::NeedsAttention,
            _ => HealthStatus::Critical,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            HealthStatus::Excellent => "Your home is in excellent condition!",
            HealthStatus::Good => "Your home is in good condition.",
            HealthStatus::Fair => "Your home maintenance could use some attention.",
            HealthStatus::NeedsAttention => "Your home needs maintenance attention soon.",
            HealthStatus::Critical => "Critical maintenance tasks need immediate attention!",
        }
    }
}

/// Completion rate of a group as a 0-100 score. No tasks is a perfect score.
fn completion_score<'a>(tasks: impl Iterator<Item = &'a Task>) -> u8 {
    let (total, completed) = tasks.fold((0u32, 0u32), |(total, completed), task| {
        let done = u32::from(task.status == TaskStatus::Completed);
        (total + 1, completed + done)
    });
    if total == 0 {
        return 100;
    }
    to_score(f64::from(completed) / f64::from(total) * 100.0)
}

fn to_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

fn by_frequency(tasks: &[Task], frequency: Frequency) -> impl Iterator<Item = &Task> {
    tasks.iter().filter(move |t| t.frequency == frequency)
}

pub fn calculate_house_health(
    user_id: UserId,
    tasks: &[Task],
    now: DateTime<Utc>,
) -> HouseHealthScore {
    let season = Season::of(now);

    let daily_score = completion_score(by_frequency(tasks, Frequency::Daily));
    let weekly_score = completion_score(by_frequency(tasks, Frequency::Weekly));
    let monthly = completion_score(by_frequency(tasks, Frequency::Monthly));
    let quarterly = completion_score(by_frequency(tasks, Frequency::Quarterly));
    let annual_score = completion_score(by_frequency(tasks, Frequency::Annual));
    let seasonal_score = completion_score(
        by_frequency(tasks, Frequency::Seasonal).filter(|t| Season::of(t.due_date) == season),
    );
    let monthly_score = to_score((f64::from(monthly) + f64::from(quarterly)) / 2.0);

    let overall_score = to_score(
        f64::from(daily_score) * DAILY_WEIGHT
            + f64::from(weekly_score) * WEEKLY_WEIGHT
            + f64::from(monthly_score) * MONTHLY_WEIGHT
            + f64::from(seasonal_score) * SEASONAL_WEIGHT
            + f64::from(annual_score) * ANNUAL_WEIGHT,
    );

    HouseHealthScore {
        user_id,
        overall_score,
        daily_score,
        weekly_score,
        monthly_score,
        seasonal_score,
        annual_score,
        last_calculated: now,
    }
}

impl HouseHealthScore {
    pub fn status(&self) -> HealthStatus {
        HealthStatus::from_score(self.overall_score)
    }

    /// Improvement hints, weakest categories first in a fixed order, then
    /// two general hints. At most five lines.
    pub fn recommendations(&self) -> Vec<String> {
        let season = Season::of(self.last_calculated);
        let categories = [
            (
                self.daily_score,
                "Complete more daily maintenance tasks to improve your score.".to_string(),
            ),
            (
                self.weekly_score,
                "Focus on completing your weekly maintenance tasks.".to_string(),
            ),
            (
                self.monthly_score,
                "Schedule time for your monthly and quarterly maintenance tasks.".to_string(),
            ),
            (
                self.seasonal_score,
                format!(
                    "Complete your {season} maintenance tasks for better seasonal preparedness."
                ),
            ),
            (
                self.annual_score,
                "Plan for your annual maintenance tasks to prevent future issues.".to_string(),
            ),
        ];

        categories
            .into_iter()
            .filter(|(score, _)| *score < RECOMMENDATION_THRESHOLD)
            .map(|(_, line)| line)
            .chain([
                "Set reminders for upcoming maintenance tasks.".to_string(),
                "Consider scheduling a professional home inspection.".to_string(),
            ])
            .take(MAX_RECOMMENDATIONS)
            .collect()
    }
}
