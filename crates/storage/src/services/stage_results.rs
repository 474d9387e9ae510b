use chrono::NaiveDateTime;

use super::ranking::rank_within_classes;
use super::snapshot::ResultsSnapshot;
use crate::Database;
use crate::dto::results::{ResultStatus, RunTime, StageResult};
use crate::error::{Result, StorageError};
use crate::models::{Punch, Stage};

/// A completed start to finish pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub stage_id: i64,
    pub start_time: NaiveDateTime,
    pub finish_time: NaiveDateTime,
    pub elapsed_ms: i64,
    pub start_punch_id: i64,
    pub finish_punch_id: i64,
}

/// Completed runs of one entrant on one stage, in chronological order.
#[derive(Debug, Clone, Default)]
pub struct StageAttempts {
    pub has_start: bool,
    pub runs: Vec<Run>,
}

/// Pairs an entrant's punches into runs.
///
/// A run opens at the earliest start punch while no run is open and closes
/// at the first finish punch strictly after it. Start punches seen while a
/// run is open are ignored, as are finish punches with no open run.
pub fn pair_runs(punches: &[&Punch], stage_id: i64, start_code: i64, finish_code: i64) -> StageAttempts {
    let mut attempts = StageAttempts::default();
    let mut open: Option<&Punch> = None;

    for &punch in punches {
        if punch.control_code == start_code {
            attempts.has_start = true;
            if open.is_none() {
                open = Some(punch);
            }
        } else if punch.control_code == finish_code
            && let Some(start) = open
            && punch.punch_time > start.punch_time
        {
            attempts.runs.push(Run {
                stage_id,
                start_time: start.punch_time,
                finish_time: punch.punch_time,
                elapsed_ms: (punch.punch_time - start.punch_time).num_milliseconds(),
                start_punch_id: start.punch_id,
                finish_punch_id: punch.punch_id,
            });
            open = None;
        }
    }

    attempts
}

/// Indices of the `count` fastest runs; equal times prefer the earlier
/// submitted finish.
pub fn fastest_runs(runs: &[Run], count: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..runs.len()).collect();
    order.sort_by_key(|&i| (runs[i].elapsed_ms, runs[i].finish_punch_id));
    order.truncate(count);
    order
}

/// Applies the stage's best-of policy: the first `max_runs` runs are
/// attempts, the fastest `runs_to_count` of those count.
pub(crate) fn stage_outcome(stage: &Stage, attempts: &StageAttempts, multiplier: usize) -> StageOutcome {
    let cap = stage
        .max_runs
        .map(|max| max.max(0) as usize * multiplier)
        .unwrap_or(usize::MAX);
    let runs: Vec<Run> = attempts.runs.iter().take(cap).copied().collect();
    let needed = stage.runs_to_count.max(1) as usize * multiplier;
    let counting = fastest_runs(&runs, needed);

    let status = if !attempts.has_start {
        ResultStatus::Dns
    } else if counting.len() < needed {
        ResultStatus::Dnf
    } else {
        ResultStatus::Ok
    };

    let elapsed_ms = (status == ResultStatus::Ok)
        .then(|| counting.iter().map(|&i| runs[i].elapsed_ms).sum::<i64>());
    let submission = counting
        .iter()
        .map(|&i| runs[i].finish_punch_id)
        .max()
        .unwrap_or(i64::MAX);

    StageOutcome {
        status,
        elapsed_ms,
        submission,
        runs,
        counting,
    }
}

#[derive(Debug, Clone)]
pub(crate) struct StageOutcome {
    pub status: ResultStatus,
    pub elapsed_ms: Option<i64>,
    pub submission: i64,
    pub runs: Vec<Run>,
    pub counting: Vec<usize>,
}

/// Results of one stage from a snapshot, ranked within class.
pub fn compute_stage_results(
    snapshot: &ResultsSnapshot,
    stage_id: i64,
    class_filter: Option<i64>,
) -> Result<Vec<StageResult>> {
    let stage = snapshot.stage(stage_id).ok_or(StorageError::NotFound)?;
    let start_code = snapshot
        .control_code(stage.start_control_id)
        .ok_or(StorageError::NotFound)?;
    let finish_code = snapshot
        .control_code(stage.finish_control_id)
        .ok_or(StorageError::NotFound)?;

    let precision = snapshot.event.time_precision;
    let by_bib = snapshot.punches_by_bib();

    let rows = snapshot
        .entries_for_stage(stage_id)
        .filter(|entry| class_filter.is_none_or(|class_id| entry.class_id == class_id))
        .map(|entry| {
            let punches = by_bib.get(&entry.bib).map(Vec::as_slice).unwrap_or(&[]);
            let attempts = pair_runs(punches, stage_id, start_code, finish_code);
            let outcome = stage_outcome(stage, &attempts, 1);

            let runs = outcome
                .runs
                .iter()
                .enumerate()
                .map(|(i, run)| RunTime {
                    start_time: run.start_time,
                    finish_time: run.finish_time,
                    elapsed_ms: run.elapsed_ms,
                    counting: outcome.status == ResultStatus::Ok && outcome.counting.contains(&i),
                })
                .collect();

            let class_name = snapshot
                .class(entry.class_id)
                .map(|c| c.name.clone())
                .unwrap_or_default();

            let row = StageResult {
                stage_id,
                entry_id: entry.entry_id,
                bib: entry.bib,
                name: entry.display_name(),
                club: entry.club.clone(),
                class_id: entry.class_id,
                class_name,
                status: outcome.status,
                elapsed_ms: outcome.elapsed_ms,
                elapsed: outcome.elapsed_ms.map(|ms| precision.format_elapsed(ms)),
                rank: None,
                behind_ms: None,
                behind: None,
                runs,
            };

            (row, outcome.submission)
        })
        .collect();

    Ok(rank_within_classes(rows, precision))
}

/// Stage results computed from the current timing log.
pub async fn stage_results(
    db: &Database,
    event_id: i64,
    stage_id: i64,
    class_filter: Option<i64>,
) -> Result<Vec<StageResult>> {
    let snapshot = ResultsSnapshot::load(db, event_id).await?;
    compute_stage_results(&snapshot, stage_id, class_filter)
}
