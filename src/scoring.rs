//! Productivity scoring over a user's task set.
//!
//! [`score`] is a pure function of the task slice and the calendar date it is evaluated
//! against. Display labels come from ordered threshold tables so every mapping is plain data.

use serde::Serialize;
use time::{Date, Duration};

use crate::task::{Priority, Task, TaskStatus};

const COMPLETION_WEIGHT: u32 = 40;
const HIGH_PRIORITY_WEIGHT: u32 = 25;
const OVERDUE_WEIGHT: u32 = 20;
const OVERDUE_PENALTY: u32 = 4;
const ACTIVE_CAP: u32 = 15;
const ACTIVE_REWARD: u32 = 3;
const MAX_SCORE: u32 = 100;

/// Tasks due before this many days from today count as "due soon".
const DUE_SOON_HORIZON_DAYS: i64 = 4;

/// Descending `(minimum score, value)` steps with a value for everything below the last step.
struct Ladder {
    steps: &'static [(u32, &'static str)],
    floor: &'static str,
}

impl Ladder {
    fn pick(&self, score: u32) -> &'static str {
        self.steps
            .iter()
            .find(|&&(minimum, _)| score >= minimum)
            .map_or(self.floor, |&(_, value)| value)
    }
}

const GRADES: Ladder = Ladder {
    steps: &[(90, "A+"), (80, "A"), (70, "B"), (60, "C"), (50, "D")],
    floor: "F",
};

const GRADE_CLASSES: Ladder = Ladder {
    steps: &[(80, "grade-a"), (70, "grade-b"), (50, "grade-c")],
    floor: "grade-f",
};

const COLORS: Ladder = Ladder {
    steps: &[(85, "#4ADE80"), (70, "#60A5FA"), (40, "#FBBF24")],
    floor: "#F87171",
};

const MESSAGES: Ladder = Ladder {
    steps: &[
        (90, "Outstanding! Your task management is excellent."),
        (80, "Great work! You're staying on top of your workload."),
        (70, "Good momentum! Keep tackling those high-priority tasks."),
        (60, "Making progress! Clear overdue items to boost your score."),
        (40, "Needs attention. Focus on high-priority and overdue tasks."),
    ],
    floor: "Time to regroup. Start by clearing overdue and high-priority tasks.",
};

#[must_use]
pub fn grade(score: u32) -> &'static str {
    GRADES.pick(score)
}

#[must_use]
pub fn grade_class(score: u32) -> &'static str {
    GRADE_CLASSES.pick(score)
}

#[must_use]
pub fn color(score: u32) -> &'static str {
    COLORS.pick(score)
}

#[must_use]
pub fn message(score: u32) -> &'static str {
    MESSAGES.pick(score)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub todo: u32,
    pub in_progress: u32,
    pub done: u32,
}

impl StatusCounts {
    fn record(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Todo => self.todo += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Done => self.done += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.todo + self.in_progress + self.done
    }
}

/// Status counts per priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityBreakdown {
    pub high: StatusCounts,
    pub medium: StatusCounts,
    pub low: StatusCounts,
}

impl PriorityBreakdown {
    fn record(&mut self, task: &Task) {
        let counts = match task.priority {
            Priority::High => &mut self.high,
            Priority::Medium => &mut self.medium,
            Priority::Low => &mut self.low,
        };
        counts.record(task.status);
    }
}

/// Due-date classification of an unfinished task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Overdue,
    DueToday,
    DueSoon,
    OnTrack,
    NoDate,
}

impl Urgency {
    /// Buckets `task` against `today`. Finished tasks have no urgency.
    #[must_use]
    pub fn of(task: &Task, today: Date) -> Option<Self> {
        if task.status == TaskStatus::Done {
            return None;
        }
        let Some(due) = task.due_date else {
            return Some(Self::NoDate);
        };
        let horizon = today.saturating_add(Duration::days(DUE_SOON_HORIZON_DAYS));
        Some(if due < today {
            Self::Overdue
        } else if due == today {
            Self::DueToday
        } else if due < horizon {
            Self::DueSoon
        } else {
            Self::OnTrack
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrgencyBuckets {
    pub overdue: u32,
    pub due_today: u32,
    pub due_soon: u32,
    pub on_track: u32,
    pub no_date: u32,
}

impl UrgencyBuckets {
    fn record(&mut self, urgency: Urgency) {
        match urgency {
            Urgency::Overdue => self.overdue += 1,
            Urgency::DueToday => self.due_today += 1,
            Urgency::DueSoon => self.due_soon += 1,
            Urgency::OnTrack => self.on_track += 1,
            Urgency::NoDate => self.no_date += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreComponents {
    pub completion: u32,
    pub high_priority: u32,
    pub overdue: u32,
    pub active: u32,
}

impl ScoreComponents {
    #[must_use]
    pub fn total(&self) -> u32 {
        (self.completion + self.high_priority + self.overdue + self.active).min(MAX_SCORE)
    }
}

/// Dashboard metrics for one task set on one day. Recomputed per request, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSnapshot {
    pub total: u32,
    pub by_status: StatusCounts,
    pub by_priority: PriorityBreakdown,
    pub urgency: UrgencyBuckets,
    pub completion_rate: u32,
    pub components: ScoreComponents,
    pub score: u32,
    pub grade: &'static str,
    pub grade_class: &'static str,
    pub color: &'static str,
    pub message: &'static str,
}

/// Aggregates `tasks` into a [`ScoreSnapshot`] as of `today`.
#[must_use]
pub fn score(tasks: &[Task], today: Date) -> ScoreSnapshot {
    let mut by_status = StatusCounts::default();
    let mut by_priority = PriorityBreakdown::default();
    let mut urgency = UrgencyBuckets::default();

    for task in tasks {
        by_status.record(task.status);
        by_priority.record(task);
        if let Some(bucket) = Urgency::of(task, today) {
            urgency.record(bucket);
        }
    }

    let total = by_status.total();
    let high = by_priority.high.total();

    let components = ScoreComponents {
        completion: ratio(by_status.done, total, COMPLETION_WEIGHT).unwrap_or(0),
        high_priority: ratio(by_priority.high.done, high, HIGH_PRIORITY_WEIGHT)
            .unwrap_or(HIGH_PRIORITY_WEIGHT),
        overdue: OVERDUE_WEIGHT.saturating_sub(urgency.overdue.saturating_mul(OVERDUE_PENALTY)),
        active: by_status
            .in_progress
            .saturating_mul(ACTIVE_REWARD)
            .min(ACTIVE_CAP),
    };
    let score = components.total();

    ScoreSnapshot {
        total,
        by_status,
        by_priority,
        urgency,
        completion_rate: ratio(by_status.done, total, 100).unwrap_or(0),
        components,
        score,
        grade: grade(score),
        grade_class: grade_class(score),
        color: color(score),
        message: message(score),
    }
}

/// `floor(part * weight / whole)`, or `None` when `whole` is zero.
fn ratio(part: u32, whole: u32, weight: u32) -> Option<u32> {
    if whole == 0 {
        return None;
    }
    let scaled = u64::from(part) * u64::from(weight) / u64::from(whole);
    Some(u32::try_from(scaled).unwrap_or(weight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TaskId, UserId};
    use time::OffsetDateTime;
    use time::macros::date;

    const TODAY: Date = date!(2024 - 03 - 15);

    fn task(status: TaskStatus, priority: Priority, due_in_days: Option<i64>) -> Task {
        Task {
            id: TaskId(1),
            title: "t".into(),
            description: None,
            status,
            priority,
            due_date: due_in_days.map(|d| TODAY + Duration::days(d)),
            created_at: OffsetDateTime::UNIX_EPOCH,
            owner: UserId(1),
        }
    }

    #[test]
    fn empty_task_set_scores_45() {
        let snapshot = score(&[], TODAY);

        assert_eq!(snapshot.total, 0);
        assert_eq!(snapshot.completion_rate, 0);
        assert_eq!(snapshot.components.completion, 0);
        assert_eq!(snapshot.components.high_priority, 25);
        assert_eq!(snapshot.components.overdue, 20);
        assert_eq!(snapshot.components.active, 0);
        assert_eq!(snapshot.score, 45);
        assert_eq!(snapshot.grade, "F");
    }

    #[test]
    fn finished_overdue_high_task_scores_85() {
        let snapshot = score(&[task(TaskStatus::Done, Priority::High, Some(-1))], TODAY);

        assert_eq!(snapshot.components.completion, 40);
        assert_eq!(snapshot.components.high_priority, 25);
        assert_eq!(snapshot.urgency.overdue, 0);
        assert_eq!(snapshot.components.overdue, 20);
        assert_eq!(snapshot.components.active, 0);
        assert_eq!(snapshot.score, 85);
        assert_eq!(snapshot.grade, "A");
        assert_eq!(snapshot.completion_rate, 100);
    }

    #[test]
    fn due_soon_boundary_is_strict_at_four_days() {
        let open = |days| task(TaskStatus::Todo, Priority::Low, Some(days));

        assert_eq!(Urgency::of(&open(3), TODAY), Some(Urgency::DueSoon));
        assert_eq!(Urgency::of(&open(4), TODAY), Some(Urgency::OnTrack));
        assert_eq!(Urgency::of(&open(1), TODAY), Some(Urgency::DueSoon));
        assert_eq!(Urgency::of(&open(0), TODAY), Some(Urgency::DueToday));
        assert_eq!(Urgency::of(&open(-1), TODAY), Some(Urgency::Overdue));
        assert_eq!(
            Urgency::of(&task(TaskStatus::InProgress, Priority::Low, None), TODAY),
            Some(Urgency::NoDate)
        );
        assert_eq!(
            Urgency::of(&task(TaskStatus::Done, Priority::Low, Some(0)), TODAY),
            None
        );
    }

    #[test]
    fn buckets_partition_unfinished_tasks() {
        let tasks: Vec<Task> = [-5, -1, 0, 1, 2, 3, 4, 10]
            .into_iter()
            .map(|d| task(TaskStatus::Todo, Priority::Medium, Some(d)))
            .chain([
                task(TaskStatus::InProgress, Priority::Medium, None),
                task(TaskStatus::Done, Priority::Medium, Some(-3)),
                task(TaskStatus::Done, Priority::Medium, None),
            ])
            .collect();

        let buckets = score(&tasks, TODAY).urgency;
        assert_eq!(buckets.overdue, 2);
        assert_eq!(buckets.due_today, 1);
        assert_eq!(buckets.due_soon, 3);
        assert_eq!(buckets.on_track, 2);
        assert_eq!(buckets.no_date, 1);

        let bucketed = buckets.overdue
            + buckets.due_today
            + buckets.due_soon
            + buckets.on_track
            + buckets.no_date;
        assert_eq!(bucketed, 9);
    }

    #[test]
    fn overdue_component_floors_at_zero() {
        let overdue = |n: usize| {
            (0..n)
                .map(|_| task(TaskStatus::Todo, Priority::Low, Some(-2)))
                .collect::<Vec<_>>()
        };

        assert_eq!(score(&overdue(1), TODAY).components.overdue, 16);
        assert_eq!(score(&overdue(4), TODAY).components.overdue, 4);
        assert_eq!(score(&overdue(5), TODAY).components.overdue, 0);
        assert_eq!(score(&overdue(9), TODAY).components.overdue, 0);
    }

    #[test]
    fn active_component_caps_at_fifteen() {
        let active = |n: usize| {
            (0..n)
                .map(|_| task(TaskStatus::InProgress, Priority::Low, None))
                .collect::<Vec<_>>()
        };

        assert_eq!(score(&active(2), TODAY).components.active, 6);
        assert_eq!(score(&active(5), TODAY).components.active, 15);
        assert_eq!(score(&active(8), TODAY).components.active, 15);
    }

    #[test]
    fn high_priority_component_rewards_completed_subset() {
        let tasks = [
            task(TaskStatus::Done, Priority::High, None),
            task(TaskStatus::Todo, Priority::High, None),
            task(TaskStatus::Todo, Priority::High, None),
            task(TaskStatus::Done, Priority::Low, None),
        ];
        let snapshot = score(&tasks, TODAY);

        // floor(1 * 25 / 3)
        assert_eq!(snapshot.components.high_priority, 8);
        // floor(2 * 40 / 4)
        assert_eq!(snapshot.components.completion, 20);
        assert_eq!(snapshot.completion_rate, 50);
    }

    #[test]
    fn completion_rate_floors() {
        let tasks = [
            task(TaskStatus::Done, Priority::Low, None),
            task(TaskStatus::Todo, Priority::Low, None),
            task(TaskStatus::Todo, Priority::Low, None),
        ];
        let snapshot = score(&tasks, TODAY);
        assert_eq!(snapshot.completion_rate, 33);
        assert_eq!(snapshot.components.completion, 13);
    }

    #[test]
    fn cross_tab_counts_status_per_priority() {
        let tasks = [
            task(TaskStatus::Done, Priority::High, None),
            task(TaskStatus::InProgress, Priority::High, None),
            task(TaskStatus::Todo, Priority::Medium, None),
            task(TaskStatus::Todo, Priority::Medium, None),
            task(TaskStatus::Done, Priority::Low, None),
        ];
        let snapshot = score(&tasks, TODAY);

        assert_eq!(snapshot.by_status, StatusCounts { todo: 2, in_progress: 1, done: 2 });
        assert_eq!(snapshot.by_priority.high, StatusCounts { todo: 0, in_progress: 1, done: 1 });
        assert_eq!(snapshot.by_priority.medium.todo, 2);
        assert_eq!(snapshot.by_priority.low.total(), 1);
        assert_eq!(snapshot.total, 5);
    }

    #[test]
    fn busy_board_scores_near_the_top() {
        let mut tasks: Vec<Task> = (0..5)
            .map(|_| task(TaskStatus::InProgress, Priority::Low, Some(10)))
            .collect();
        tasks.extend((0..195).map(|_| task(TaskStatus::Done, Priority::High, None)));

        let snapshot = score(&tasks, TODAY);
        // 39 + 25 + 20 + 15
        assert_eq!(snapshot.components.total(), 99);
        assert_eq!(snapshot.score, 99);
        assert_eq!(snapshot.grade, "A+");
    }

    #[test]
    fn component_total_is_clamped_to_100() {
        let components = ScoreComponents {
            completion: COMPLETION_WEIGHT,
            high_priority: HIGH_PRIORITY_WEIGHT,
            overdue: OVERDUE_WEIGHT,
            active: ACTIVE_CAP,
        };
        assert_eq!(components.total(), MAX_SCORE);

        let components = ScoreComponents {
            active: ACTIVE_CAP + 10,
            ..components
        };
        assert_eq!(components.total(), MAX_SCORE);
    }

    #[test]
    fn scoring_is_idempotent() {
        let tasks = [
            task(TaskStatus::Todo, Priority::High, Some(-2)),
            task(TaskStatus::InProgress, Priority::Medium, Some(2)),
            task(TaskStatus::Done, Priority::Low, None),
        ];
        assert_eq!(score(&tasks, TODAY), score(&tasks, TODAY));
    }

    #[test]
    fn grade_thresholds() {
        assert_eq!(grade(100), "A+");
        assert_eq!(grade(90), "A+");
        assert_eq!(grade(89), "A");
        assert_eq!(grade(80), "A");
        assert_eq!(grade(70), "B");
        assert_eq!(grade(60), "C");
        assert_eq!(grade(50), "D");
        assert_eq!(grade(49), "F");
        assert_eq!(grade(0), "F");
    }

    #[test]
    fn display_tables_use_their_own_thresholds() {
        assert_eq!(color(85), "#4ADE80");
        assert_eq!(color(84), "#60A5FA");
        assert_eq!(color(40), "#FBBF24");
        assert_eq!(color(39), "#F87171");

        assert_eq!(grade_class(80), "grade-a");
        assert_eq!(grade_class(79), "grade-b");
        assert_eq!(grade_class(50), "grade-c");
        assert_eq!(grade_class(49), "grade-f");

        assert!(message(95).starts_with("Outstanding"));
        assert!(message(45).starts_with("Needs attention"));
        assert!(message(10).starts_with("Time to regroup"));
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let json = serde_json::to_value(score(&[], TODAY)).unwrap();
        assert_eq!(json["score"], 45);
        assert_eq!(json["completionRate"], 0);
        assert_eq!(json["components"]["highPriority"], 25);
        assert_eq!(json["urgency"]["dueSoon"], 0);
        assert_eq!(json["gradeClass"], "grade-f");
    }
}
