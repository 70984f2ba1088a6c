use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};

use crate::models::{Repeat, SortKey, Tab, Task, TaskDraft};

const MONTHLY_OCCURRENCES: u32 = 12;

/// Last date (inclusive) a single expansion may produce. Feb 29 anchors clamp to Feb 28.
pub fn expansion_limit(anchor: NaiveDate) -> NaiveDate {
    anchor
        .checked_add_months(Months::new(12))
        .unwrap_or(NaiveDate::MAX)
}

/// Materializes one task per occurrence of `draft.repeat` starting at `anchor`.
///
/// Every instance shares `group_id` and `created_at`; ordering inside the batch is by date.
/// Inbox drafts never repeat.
pub fn expand(
    draft: &TaskDraft,
    title: &str,
    anchor: NaiveDate,
    group_id: &str,
    created_at: SortKey,
) -> Vec<Task> {
    occurrence_dates(draft.tab, draft.repeat, anchor)
        .into_iter()
        .map(|date| Task {
            id: format!("{group_id}_{date}"),
            title: title.to_string(),
            has_time: draft.has_time,
            time: date.and_time(draft.time),
            has_duration: draft.has_duration,
            duration: draft.duration,
            tab: draft.tab,
            created_at,
            date,
            is_completed: false,
            repeat: draft.repeat,
            group_id: Some(group_id.to_string()),
            notification: draft.notification,
        })
        .collect()
}

pub fn occurrence_dates(tab: Tab, repeat: Repeat, anchor: NaiveDate) -> Vec<NaiveDate> {
    if tab == Tab::Inbox {
        return vec![anchor];
    }
    let limit = expansion_limit(anchor);
    match repeat {
        Repeat::None => vec![anchor],
        Repeat::Monthly => monthly_dates(anchor, limit),
        Repeat::Daily | Repeat::Weekdays | Repeat::Weekends | Repeat::Weekly => {
            let mut dates = Vec::new();
            let mut current = anchor;
            while current <= limit {
                if matches_rule(repeat, anchor, current) {
                    dates.push(current);
                }
                current = match current.succ_opt() {
                    Some(next) => next,
                    None => break,
                };
            }
            dates
        }
    }
}

fn matches_rule(repeat: Repeat, anchor: NaiveDate, date: NaiveDate) -> bool {
    match repeat {
        Repeat::Daily => true,
        Repeat::Weekdays => !is_weekend(date.weekday()),
        Repeat::Weekends => is_weekend(date.weekday()),
        Repeat::Weekly => date.weekday() == anchor.weekday(),
        Repeat::None | Repeat::Monthly => false,
    }
}

fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

fn monthly_dates(anchor: NaiveDate, limit: NaiveDate) -> Vec<NaiveDate> {
    let target_day = anchor.day();
    let mut dates = Vec::new();
    for offset in 0..MONTHLY_OCCURRENCES {
        let month0 = anchor.month0() + offset;
        let year = anchor.year() + (month0 / 12) as i32;
        let month = month0 % 12 + 1;
        // Clamp per month: a 31st anchor lands on the 30th in April and the 31st again in May.
        let day = target_day.min(last_day_of_month(year, month));
        let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
            break;
        };
        if date > limit {
            break;
        }
        dates.push(date);
    }
    dates
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .map(|first_next| (first_next - Duration::days(1)).day())
        .unwrap_or(28)
}
