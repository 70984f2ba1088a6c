use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

use crate::models::{Locale, Slot, Tab, Task};
use crate::slots::DaySlots;

pub const INBOX_PAGE_SIZE: usize = 15;

/// Wake and sleep count toward every day's total, whether or not they were touched.
pub const BASELINE_SLOTS_PER_DAY: usize = 2;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayFlow {
    pub timed: Vec<Task>,
    pub untimed: Vec<Task>,
}

impl DayFlow {
    pub fn rendered(&self) -> Vec<Task> {
        self.timed.iter().chain(self.untimed.iter()).cloned().collect()
    }
}

pub fn day_flow(tasks: &[Task], date: NaiveDate) -> DayFlow {
    let (mut timed, mut untimed): (Vec<Task>, Vec<Task>) = tasks
        .iter()
        .filter(|task| task.tab == Tab::Flow && task.date == date)
        .cloned()
        .partition(|task| task.has_time);
    timed.sort_by_key(|task| task.time);
    untimed.sort_by(|a, b| a.created_at.total_cmp(&b.created_at));
    DayFlow { timed, untimed }
}

pub fn inbox_page(tasks: &[Task], page: usize) -> Vec<Task> {
    let mut inbox: Vec<Task> = tasks
        .iter()
        .filter(|task| task.tab == Tab::Inbox)
        .cloned()
        .collect();
    inbox.sort_by(|a, b| a.created_at.total_cmp(&b.created_at));
    inbox.truncate(page.max(1) * INBOX_PAGE_SIZE);
    inbox
}

pub fn inbox_count(tasks: &[Task]) -> usize {
    tasks.iter().filter(|task| task.tab == Tab::Inbox).count()
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Monday..Sunday of the week containing `date`.
pub fn week_dates(date: NaiveDate) -> Vec<NaiveDate> {
    let monday = week_start(date);
    (0..7).map(|offset| monday + Duration::days(offset)).collect()
}

pub fn shift_week(start: NaiveDate, weeks: i64) -> NaiveDate {
    week_start(start) + Duration::weeks(weeks)
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub struct DayProgress {
    pub completed: usize,
    pub total: usize,
}

impl DayProgress {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64
    }

    pub fn is_done(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }

    pub fn only_baseline(&self) -> bool {
        self.total == BASELINE_SLOTS_PER_DAY
    }
}

pub fn day_progress(tasks: &[Task], slots: &DaySlots, date: NaiveDate) -> DayProgress {
    let (flow_total, flow_completed) = tasks
        .iter()
        .filter(|task| task.tab == Tab::Flow && task.date == date)
        .fold((0, 0), |(total, done), task| {
            (total + 1, done + usize::from(task.is_completed))
        });
    let slots_completed = [Slot::Wake, Slot::Sleep]
        .into_iter()
        .filter(|slot| slots.is_completed(date, *slot))
        .count();
    DayProgress {
        completed: flow_completed + slots_completed,
        total: flow_total + BASELINE_SLOTS_PER_DAY,
    }
}

pub fn week_progress(
    tasks: &[Task],
    slots: &DaySlots,
    anchor: NaiveDate,
) -> Vec<(NaiveDate, DayProgress)> {
    week_dates(anchor)
        .into_iter()
        .map(|date| (date, day_progress(tasks, slots, date)))
        .collect()
}

pub fn prompt_hint(today: NaiveDate, target: NaiveDate, locale: Locale) -> String {
    let diff = (target - today).num_days();
    let this_week = week_start(today);
    let in_this_week = target >= this_week && target < this_week + Duration::days(7);
    match locale {
        Locale::Ko => match diff {
            0 => "오늘 계획을\n세워보세요".to_string(),
            1 => "내일 계획을\n세워보세요".to_string(),
            _ if in_this_week => format!("{}요일 계획을\n세워보세요", weekday_ko(target.weekday())),
            _ => format!("{}월 {}일 계획을\n세워보세요", target.month(), target.day()),
        },
        Locale::En => match diff {
            0 => "Plan your\nday today".to_string(),
            1 => "Plan your\ntomorrow".to_string(),
            _ if in_this_week => format!("Plan your\n{}", target.format("%A")),
            _ => format!("Plan your\n{}", target.format("%B %-d")),
        },
    }
}

fn weekday_ko(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "월",
        Weekday::Tue => "화",
        Weekday::Wed => "수",
        Weekday::Thu => "목",
        Weekday::Fri => "금",
        Weekday::Sat => "토",
        Weekday::Sun => "일",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DurationOption, NotificationLead, Repeat};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: &str, tab: Tab, day: NaiveDate, hour: Option<u32>, created_at: f64) -> Task {
        Task {
            id: id.to_string(),
            title: id.to_string(),
            has_time: hour.is_some(),
            time: day.and_hms_opt(hour.unwrap_or(12), 0, 0).unwrap(),
            has_duration: false,
            duration: DurationOption::Hour1,
            tab,
            created_at,
            date: day,
            is_completed: false,
            repeat: Repeat::None,
            group_id: None,
            notification: NotificationLead::None,
        }
    }

    #[test]
    fn day_flow_orders_timed_by_time_then_untimed_by_created_at() {
        let d = date(2025, 2, 3);
        let tasks = vec![
            task("late", Tab::Flow, d, Some(18), 1.0),
            task("u2", Tab::Flow, d, None, 20.0),
            task("early", Tab::Flow, d, Some(8), 2.0),
            task("u1", Tab::Flow, d, None, 10.0),
            task("other-day", Tab::Flow, date(2025, 2, 4), Some(7), 0.0),
            task("inbox", Tab::Inbox, d, None, 0.0),
        ];
        let flow = day_flow(&tasks, d);
        assert_eq!(flow.timed.len(), 2);
        let rendered = flow.rendered();
        let ids: Vec<&str> = rendered.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late", "u1", "u2"]);
    }

    #[test]
    fn inbox_pages_in_fifteens() {
        let d = date(2025, 2, 3);
        let tasks: Vec<Task> = (0..40)
            .rev()
            .map(|i| task(&format!("i{i}"), Tab::Inbox, d, None, i as f64))
            .collect();
        let first = inbox_page(&tasks, 1);
        assert_eq!(first.len(), 15);
        assert_eq!(first[0].id, "i0");
        assert_eq!(inbox_page(&tasks, 2).len(), 30);
        assert_eq!(inbox_page(&tasks, 3).len(), 40);
        assert_eq!(inbox_page(&tasks, 0).len(), 15);
        assert_eq!(inbox_count(&tasks), 40);
    }

    #[test]
    fn week_runs_monday_to_sunday() {
        let sunday = date(2025, 3, 16);
        let week = week_dates(sunday);
        assert_eq!(week.first(), Some(&date(2025, 3, 10)));
        assert_eq!(week.last(), Some(&sunday));
        assert_eq!(shift_week(date(2025, 3, 12), 1), date(2025, 3, 17));
        assert_eq!(shift_week(date(2025, 3, 12), -1), date(2025, 3, 3));
    }

    #[test]
    fn progress_always_counts_two_baseline_slots() {
        let d = date(2025, 2, 3);
        let slots = DaySlots::default();
        let empty = day_progress(&[], &slots, d);
        assert_eq!(empty, DayProgress { completed: 0, total: 2 });
        assert!(empty.only_baseline());
        assert!(!empty.is_done());

        let mut done = task("a", Tab::Flow, d, None, 1.0);
        done.is_completed = true;
        let tasks = vec![done, task("b", Tab::Flow, d, Some(9), 2.0)];
        let mut slots = DaySlots::default();
        slots.toggle_completed(d, Slot::Wake);
        let progress = day_progress(&tasks, &slots, d);
        assert_eq!(progress, DayProgress { completed: 2, total: 4 });
        assert_eq!(progress.ratio(), 0.5);
    }

    #[test]
    fn week_progress_covers_seven_days() {
        let d = date(2025, 2, 5);
        let tasks = vec![task("a", Tab::Flow, d, None, 1.0)];
        let week = week_progress(&tasks, &DaySlots::default(), d);
        assert_eq!(week.len(), 7);
        let (_, wed) = week.iter().find(|(day, _)| *day == d).unwrap();
        assert_eq!(wed.total, 3);
    }

    #[test]
    fn prompt_hint_is_relative_to_today() {
        let today = date(2025, 3, 11); // Tuesday
        assert_eq!(prompt_hint(today, today, Locale::Ko), "오늘 계획을\n세워보세요");
        assert_eq!(prompt_hint(today, date(2025, 3, 12), Locale::Ko), "내일 계획을\n세워보세요");
        assert_eq!(prompt_hint(today, date(2025, 3, 14), Locale::Ko), "금요일 계획을\n세워보세요");
        assert_eq!(prompt_hint(today, date(2025, 3, 20), Locale::Ko), "3월 20일 계획을\n세워보세요");
        assert_eq!(prompt_hint(today, date(2025, 3, 14), Locale::En), "Plan your\nFriday");
        assert_eq!(prompt_hint(today, date(2025, 4, 2), Locale::En), "Plan your\nApril 2");
    }
}
