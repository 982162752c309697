//! Splits a telemetry snapshot into screen-sized pages.
//!
//! Entries fill pages greedily in snapshot order. The date line, the time line
//! right after it and the sync-status line right after that form one group: if
//! the group would straddle a page boundary it moves to a fresh page as a unit,
//! even when that page then holds more lines than `capacity`.

use crate::telemetry::{Entry, Snapshot, LABEL_DATE, LABEL_SYNC, LABEL_TIME};

/// Pixels between consecutive text rows.
pub const LINE_SPACING: u32 = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub entries: Vec<Entry>,
}

impl Page {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }
}

/// Rows of text that fit on the panel: `height / (glyph_height + LINE_SPACING)`.
pub fn line_capacity(panel_height: u32, glyph_height: u32) -> usize {
    (panel_height / (glyph_height + LINE_SPACING)) as usize
}

/// Deterministic pagination of `snapshot` into pages of at most `capacity` lines,
/// except where the date/time/sync group forces a taller page.
pub fn paginate(snapshot: &Snapshot, capacity: usize) -> Vec<Page> {
    let capacity = capacity.max(1);
    let entries = &snapshot.entries;
    let mut pages = Vec::new();
    let mut current: Vec<Entry> = Vec::new();
    let mut idx = 0;

    while idx < entries.len() {
        let group = clock_group_len(entries, idx);
        if current.len() + group > capacity && !current.is_empty() {
            pages.push(Page {
                entries: std::mem::take(&mut current),
            });
        }
        current.extend(entries[idx..idx + group].iter().cloned());
        idx += group;
        if current.len() >= capacity {
            pages.push(Page {
                entries: std::mem::take(&mut current),
            });
        }
    }

    if !current.is_empty() {
        pages.push(Page { entries: current });
    }
    pages
}

/// Number of entries starting at `idx` that must share a page: 3 for
/// date+time+sync, 2 for date+time, otherwise 1.
fn clock_group_len(entries: &[Entry], idx: usize) -> usize {
    let label_at = |i: usize| entries.get(i).map(|e| e.label.as_str());
    if label_at(idx) != Some(LABEL_DATE) || label_at(idx + 1) != Some(LABEL_TIME) {
        return 1;
    }
    if label_at(idx + 2) == Some(LABEL_SYNC) {
        3
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{LABEL_DISK, LABEL_IP, LABEL_LOAD, LABEL_MEM, LABEL_TEMP};

    fn snapshot(labels: &[&str]) -> Snapshot {
        Snapshot::new(
            labels
                .iter()
                .map(|l| Entry::new(*l, format!("{l}-value")))
                .collect(),
        )
    }

    fn full() -> Snapshot {
        snapshot(&[
            LABEL_IP, LABEL_DATE, LABEL_TIME, LABEL_SYNC, LABEL_LOAD, LABEL_TEMP, LABEL_MEM,
            LABEL_DISK,
        ])
    }

    fn labels(pages: &[Page]) -> Vec<Vec<&str>> {
        pages.iter().map(Page::labels).collect()
    }

    #[test]
    fn capacity_from_font_metrics() {
        assert_eq!(line_capacity(32, 8), 3);
        assert_eq!(line_capacity(32, 10), 2);
        assert_eq!(line_capacity(64, 14), 4);
        assert_eq!(line_capacity(16, 20), 0);
    }

    #[test]
    fn capacity_four_splits_evenly() {
        let pages = paginate(&full(), 4);
        assert_eq!(
            labels(&pages),
            vec![
                vec![LABEL_IP, LABEL_DATE, LABEL_TIME, LABEL_SYNC],
                vec![LABEL_LOAD, LABEL_TEMP, LABEL_MEM, LABEL_DISK],
            ]
        );
    }

    #[test]
    fn capacity_three_moves_group_to_next_page() {
        let pages = paginate(&full(), 3);
        assert_eq!(
            labels(&pages),
            vec![
                vec![LABEL_IP],
                vec![LABEL_DATE, LABEL_TIME, LABEL_SYNC],
                vec![LABEL_LOAD, LABEL_TEMP, LABEL_MEM],
                vec![LABEL_DISK],
            ]
        );
    }

    #[test]
    fn small_capacity_still_keeps_group_together() {
        let pages = paginate(&full(), 2);
        assert_eq!(
            labels(&pages),
            vec![
                vec![LABEL_IP],
                vec![LABEL_DATE, LABEL_TIME, LABEL_SYNC],
                vec![LABEL_LOAD, LABEL_TEMP],
                vec![LABEL_MEM, LABEL_DISK],
            ]
        );
        let pages = paginate(&full(), 1);
        assert_eq!(pages[1].len(), 3);
        assert_eq!(pages.len(), 6);
    }

    #[test]
    fn zero_capacity_behaves_like_one() {
        assert_eq!(paginate(&full(), 0), paginate(&full(), 1));
    }

    #[test]
    fn group_is_never_split_for_any_capacity() {
        for capacity in 1..=10 {
            let pages = paginate(&full(), capacity);
            let holder = pages
                .iter()
                .find(|p| p.labels().contains(&LABEL_DATE))
                .unwrap();
            let l = holder.labels();
            assert!(l.contains(&LABEL_TIME) && l.contains(&LABEL_SYNC), "capacity {capacity}");
            for page in &pages {
                if page.labels().contains(&LABEL_DATE) {
                    continue;
                }
                assert!(page.len() <= capacity, "capacity {capacity}");
            }
        }
    }

    #[test]
    fn pagination_is_deterministic_and_lossless() {
        let snap = full();
        let first = paginate(&snap, 3);
        assert_eq!(first, paginate(&snap, 3));
        let flattened: Vec<Entry> = first.into_iter().flat_map(|p| p.entries).collect();
        assert_eq!(flattened, snap.entries);
    }

    #[test]
    fn date_without_time_is_not_grouped() {
        let pages = paginate(&snapshot(&[LABEL_IP, LABEL_DATE, LABEL_LOAD]), 1);
        assert_eq!(pages.len(), 3);
    }

    #[test]
    fn date_and_time_without_sync_group_as_pair() {
        let pages = paginate(&snapshot(&[LABEL_IP, LABEL_DATE, LABEL_TIME, LABEL_LOAD]), 2);
        assert_eq!(
            labels(&pages),
            vec![vec![LABEL_IP], vec![LABEL_DATE, LABEL_TIME], vec![LABEL_LOAD]]
        );
    }

    #[test]
    fn empty_snapshot_has_no_pages() {
        assert!(paginate(&Snapshot::default(), 4).is_empty());
    }
}
