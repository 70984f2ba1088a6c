use crate::models::{SortKey, Task};

/// Distance kept between a moved item and the head or tail of the untimed run.
pub const REORDER_GAP_MS: SortKey = 60_000.0;

/// Computes the new `created_at` for an item dropped at `to_index` of a rendered
/// `[timed.., untimed..]` day list.
///
/// The moved item always lands in the untimed run. Only the moved item's key changes;
/// nothing is renumbered, so repeated drops between the same two neighbours eventually
/// run out of float precision. Returns `None` when the item is not in `day_items`.
pub fn reindex(
    moved_id: &str,
    from_index: usize,
    to_index: usize,
    day_items: &[Task],
    now_ms: SortKey,
) -> Option<SortKey> {
    let moved = day_items
        .get(from_index)
        .filter(|task| task.id == moved_id)
        .or_else(|| day_items.iter().find(|task| task.id == moved_id))?;

    let others = day_items.iter().filter(|task| task.id != moved.id);
    let timed_count = others.clone().filter(|task| task.has_time).count();
    let mut untimed: Vec<SortKey> = others
        .filter(|task| !task.has_time)
        .map(|task| task.created_at)
        .collect();
    untimed.sort_by(|a, b| a.total_cmp(b));

    let relative = to_index.saturating_sub(timed_count).min(untimed.len());
    Some(key_at(&untimed, relative, now_ms))
}

fn key_at(untimed: &[SortKey], relative: usize, now_ms: SortKey) -> SortKey {
    match untimed {
        [] => now_ms,
        [first, ..] if relative == 0 => first - REORDER_GAP_MS,
        [.., last] if relative >= untimed.len() => last + REORDER_GAP_MS,
        _ => (untimed[relative - 1] + untimed[relative]) / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DurationOption, NotificationLead, Repeat, Tab};
    use chrono::NaiveDate;

    fn item(id: &str, has_time: bool, created_at: SortKey) -> Task {
        let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        Task {
            id: id.to_string(),
            title: id.to_string(),
            has_time,
            time: date.and_hms_opt(9, 0, 0).unwrap(),
            has_duration: false,
            duration: DurationOption::Hour1,
            tab: Tab::Flow,
            created_at,
            date,
            is_completed: false,
            repeat: Repeat::None,
            group_id: None,
            notification: NotificationLead::None,
        }
    }

    // Rendered list: [t1 (timed), a=100, b=200, c=300, m=400 (moved)].
    fn day() -> Vec<Task> {
        vec![
            item("t1", true, 5.0),
            item("a", false, 100.0),
            item("b", false, 200.0),
            item("c", false, 300.0),
            item("m", false, 400.0),
        ]
    }

    #[test]
    fn head_insert_goes_one_minute_before_first() {
        assert_eq!(reindex("m", 4, 1, &day(), 0.0), Some(100.0 - 60_000.0));
    }

    #[test]
    fn dropping_onto_timed_region_clamps_to_head() {
        assert_eq!(reindex("m", 4, 0, &day(), 0.0), Some(100.0 - 60_000.0));
    }

    #[test]
    fn mid_insert_takes_the_mean_of_neighbours() {
        // relative index 2 sits between b=200 and c=300.
        assert_eq!(reindex("m", 4, 3, &day(), 0.0), Some(250.0));
    }

    #[test]
    fn tail_insert_goes_one_minute_after_last() {
        assert_eq!(reindex("a", 1, 4, &day(), 0.0), Some(400.0 + 60_000.0));
        assert_eq!(reindex("a", 1, 99, &day(), 0.0), Some(400.0 + 60_000.0));
    }

    #[test]
    fn empty_untimed_run_uses_now() {
        let items = vec![item("t1", true, 1.0), item("t2", true, 2.0)];
        assert_eq!(reindex("t2", 1, 1, &items, 1_700_000_000_000.0), Some(1_700_000_000_000.0));
    }

    #[test]
    fn moved_timed_item_is_excluded_from_timed_count() {
        let items = vec![
            item("t1", true, 1.0),
            item("t2", true, 2.0),
            item("a", false, 100.0),
            item("b", false, 200.0),
        ];
        // Without t2 there is one timed item, so index 2 is between a and b.
        assert_eq!(reindex("t2", 1, 2, &items, 0.0), Some(150.0));
    }

    #[test]
    fn keys_can_be_fractional() {
        let items = vec![item("a", false, 1.0), item("b", false, 2.0), item("m", false, 9.0)];
        assert_eq!(reindex("m", 2, 1, &items, 0.0), Some(1.5));
    }

    #[test]
    fn stale_from_index_falls_back_to_id_lookup() {
        assert_eq!(reindex("m", 0, 3, &day(), 0.0), Some(250.0));
    }

    #[test]
    fn missing_item_is_a_no_op() {
        assert_eq!(reindex("ghost", 0, 1, &day(), 0.0), None);
        assert_eq!(reindex("m", 4, 1, &[], 0.0), None);
    }
}
