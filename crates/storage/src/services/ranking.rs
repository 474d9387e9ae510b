use std::cmp::Ordering;

use crate::dto::results::{OverallResult, ResultStatus, StageResult};
use crate::models::TimePrecision;

/// Row that can be placed within its class.
pub(crate) trait Ranked {
    fn class_key(&self) -> (&str, i64);
    fn status(&self) -> ResultStatus;
    fn time_ms(&self) -> Option<i64>;
    fn bib(&self) -> i64;
    fn place(&mut self, rank: Option<u32>, behind_ms: Option<i64>, behind: Option<String>);
}

fn status_order(status: ResultStatus) -> u8 {
    match status {
        ResultStatus::Ok => 0,
        ResultStatus::Dnf => 1,
        ResultStatus::Dns => 2,
    }
}

/// Orders rows by class, then `ok` rows by time, then `dnf`, then `dns`.
///
/// Each row comes with its submission key (id of the deciding finish punch):
/// equal times share a rank and are listed in submission order. Only `ok`
/// rows get a rank and a time behind the class leader.
pub(crate) fn rank_within_classes<T: Ranked>(
    mut rows: Vec<(T, i64)>,
    precision: TimePrecision,
) -> Vec<T> {
    rows.sort_by(|(a, a_key), (b, b_key)| {
        a.class_key()
            .cmp(&b.class_key())
            .then_with(|| status_order(a.status()).cmp(&status_order(b.status())))
            .then_with(|| match (a.time_ms(), b.time_ms()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => Ordering::Equal,
            })
            .then_with(|| {
                if a.status() == ResultStatus::Ok {
                    a_key.cmp(b_key)
                } else {
                    Ordering::Equal
                }
            })
            .then_with(|| a.bib().cmp(&b.bib()))
    });

    let mut ranked = Vec::with_capacity(rows.len());
    let mut current_class: Option<i64> = None;
    let mut leader_ms = 0;
    let mut position = 0u32;
    let mut last: Option<(i64, u32)> = None;

    for (mut row, _) in rows {
        let class_id = row.class_key().1;
        if current_class != Some(class_id) {
            current_class = Some(class_id);
            position = 0;
            last = None;
        }

        match (row.status(), row.time_ms()) {
            (ResultStatus::Ok, Some(time)) => {
                position += 1;
                if last.is_none() {
                    leader_ms = time;
                }
                let rank = match last {
                    Some((prev_time, prev_rank)) if prev_time == time => prev_rank,
                    _ => position,
                };
                last = Some((time, rank));

                let behind = time - leader_ms;
                row.place(
                    Some(rank),
                    Some(behind),
                    Some(format!("+{}", precision.format_elapsed(behind))),
                );
            }
            _ => row.place(None, None, None),
        }

        ranked.push(row);
    }

    ranked
}

impl Ranked for StageResult {
    fn class_key(&self) -> (&str, i64) {
        (&self.class_name, self.class_id)
    }

    fn status(&self) -> ResultStatus {
        self.status
    }

    fn time_ms(&self) -> Option<i64> {
        self.elapsed_ms
    }

    fn bib(&self) -> i64 {
        self.bib
    }

    fn place(&mut self, rank: Option<u32>, behind_ms: Option<i64>, behind: Option<String>) {
        self.rank = rank;
        self.behind_ms = behind_ms;
        self.behind = behind;
    }
}

impl Ranked for OverallResult {
    fn class_key(&self) -> (&str, i64) {
        (&self.class_name, self.class_id)
    }

    fn status(&self) -> ResultStatus {
        self.status
    }

    fn time_ms(&self) -> Option<i64> {
        self.total_ms
    }

    fn bib(&self) -> i64 {
        self.bib
    }

    fn place(&mut self, rank: Option<u32>, behind_ms: Option<i64>, behind: Option<String>) {
        self.rank = rank;
        self.behind_ms = behind_ms;
        self.behind = behind;
    }
}
