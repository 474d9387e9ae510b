use std::collections::HashMap;

use super::ranking::rank_within_classes;
use super::snapshot::ResultsSnapshot;
use super::stage_results::{Run, StageAttempts, pair_runs, stage_outcome};
use crate::Database;
use crate::dto::results::{OverallResult, OverallStageTime, ResultStatus};
use crate::error::Result;
use crate::models::{Course, Entry, Punch, Stage};

/// Overall standings from a snapshot, ranked within class.
///
/// Each timed stage of the class course contributes its counting runs.
/// A stage listed `k` times counts `k` times as many runs, and with
/// `allow_repeat` every lap repeats that requirement. Untimed stages are
/// neither required nor summed.
pub fn compute_overall(snapshot: &ResultsSnapshot, class_filter: Option<i64>) -> Vec<OverallResult> {
    let precision = snapshot.event.time_precision;
    let by_bib = snapshot.punches_by_bib();

    let rows = snapshot
        .entries
        .iter()
        .filter(|entry| class_filter.is_none_or(|class_id| entry.class_id == class_id))
        .filter_map(|entry| {
            let class = snapshot.class(entry.class_id)?;
            let course = snapshot.course(class.course_id)?;
            let punches = by_bib.get(&entry.bib).map(Vec::as_slice).unwrap_or(&[]);

            let (status, total_ms, submission, stages) =
                entry_overall(snapshot, course, punches);

            let row = OverallResult {
                entry_id: entry.entry_id,
                bib: entry.bib,
                name: Entry::display_name(entry),
                club: entry.club.clone(),
                class_id: class.class_id,
                class_name: class.name.clone(),
                status,
                total_ms,
                total: total_ms.map(|ms| precision.format_elapsed(ms)),
                rank: None,
                behind_ms: None,
                behind: None,
                stages,
            };

            Some((row, submission))
        })
        .collect();

    rank_within_classes(rows, precision)
}

fn entry_overall(
    snapshot: &ResultsSnapshot,
    course: &Course,
    punches: &[&Punch],
) -> (ResultStatus, Option<i64>, i64, Vec<OverallStageTime>) {
    let sequence: Vec<&Stage> = snapshot
        .course_stage_ids(course.course_id)
        .iter()
        .filter_map(|id| snapshot.stage(*id))
        .filter(|stage| stage.is_timed)
        .collect();

    let mut distinct: Vec<(&Stage, usize)> = Vec::new();
    for stage in &sequence {
        match distinct.iter_mut().find(|(s, _)| s.stage_id == stage.stage_id) {
            Some((_, occurrences)) => *occurrences += 1,
            None => distinct.push((stage, 1)),
        }
    }

    if distinct.is_empty() {
        return (ResultStatus::Dns, None, i64::MAX, Vec::new());
    }

    let passes = if course.allow_repeat {
        course.laps.max(1) as usize
    } else {
        1
    };

    let mut attempts: HashMap<i64, StageAttempts> = HashMap::new();
    for (stage, occurrences) in &distinct {
        let (Some(start), Some(finish)) = (
            snapshot.control_code(stage.start_control_id),
            snapshot.control_code(stage.finish_control_id),
        ) else {
            continue;
        };

        let mut stage_attempts = pair_runs(punches, stage.stage_id, start, finish);
        if let Some(max_runs) = stage.max_runs {
            stage_attempts
                .runs
                .truncate(max_runs.max(0) as usize * occurrences * passes);
        }
        attempts.insert(stage.stage_id, stage_attempts);
    }

    if !course.stages_any_order {
        let order: Vec<i64> = sequence.iter().map(|s| s.stage_id).collect();
        keep_course_order(&mut attempts, &order, passes);
    }

    let mut any_start = false;
    let mut all_ok = true;
    let mut total = 0;
    let mut submission = 0;
    let mut stage_times = Vec::with_capacity(distinct.len());

    for (stage, occurrences) in &distinct {
        let stage_attempts = attempts.remove(&stage.stage_id).unwrap_or_default();
        any_start |= stage_attempts.has_start;

        let outcome = stage_outcome(stage, &stage_attempts, occurrences * passes);
        match outcome.elapsed_ms {
            Some(ms) if outcome.status == ResultStatus::Ok => {
                total += ms;
                submission = submission.max(outcome.submission);
            }
            _ => all_ok = false,
        }

        stage_times.push(OverallStageTime {
            stage_id: stage.stage_id,
            stage_number: stage.stage_number,
            status: outcome.status,
            elapsed_ms: outcome.elapsed_ms,
        });
    }

    if !any_start {
        (ResultStatus::Dns, None, i64::MAX, stage_times)
    } else if !all_ok {
        (ResultStatus::Dnf, None, i64::MAX, stage_times)
    } else {
        (ResultStatus::Ok, Some(total), submission, stage_times)
    }
}

/// Drops runs that break the course sequence.
///
/// Runs are walked by start time against the course order, repeated for
/// `passes` laps. A run of the expected stage fills the next slot; another
/// run of the stage just completed is an extra attempt at that slot; any
/// other run is ignored.
fn keep_course_order(attempts: &mut HashMap<i64, StageAttempts>, order: &[i64], passes: usize) {
    if order.is_empty() {
        return;
    }

    let mut merged: Vec<Run> = attempts.values().flat_map(|a| a.runs.iter().copied()).collect();
    merged.sort_by_key(|run| (run.start_time, run.start_punch_id));

    for stage_attempts in attempts.values_mut() {
        stage_attempts.runs.clear();
    }

    let slots = order.len() * passes;
    let mut filled = 0;
    let mut last: Option<i64> = None;

    for run in merged {
        let expected = (filled < slots).then(|| order[filled % order.len()]);

        let accepted = if expected == Some(run.stage_id) {
            filled += 1;
            true
        } else {
            last == Some(run.stage_id)
        };

        if accepted {
            last = Some(run.stage_id);
            if let Some(stage_attempts) = attempts.get_mut(&run.stage_id) {
                stage_attempts.runs.push(run);
            }
        }
    }
}

/// Overall standings computed from the current timing log.
pub async fn overall(db: &Database, event_id: i64, class_filter: Option<i64>) -> Result<Vec<OverallResult>> {
    let snapshot = ResultsSnapshot::load(db, event_id).await?;
    Ok(compute_overall(&snapshot, class_filter))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    use super::*;

    fn t(offset_s: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 14)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            + Duration::seconds(offset_s)
    }

    fn run(stage_id: i64, start_s: i64, elapsed_s: i64, id: i64) -> Run {
        Run {
            stage_id,
            start_time: t(start_s),
            finish_time: t(start_s + elapsed_s),
            elapsed_ms: elapsed_s * 1000,
            start_punch_id: id,
            finish_punch_id: id + 1,
        }
    }

    fn attempts(runs: Vec<Run>) -> StageAttempts {
        StageAttempts {
            has_start: true,
            runs,
        }
    }

    #[test]
    fn test_out_of_order_run_is_ignored() {
        let mut map = HashMap::new();
        map.insert(1, attempts(vec![run(1, 600, 50, 3)]));
        map.insert(2, attempts(vec![run(2, 0, 40, 1), run(2, 1200, 45, 5)]));

        keep_course_order(&mut map, &[1, 2], 1);

        assert_eq!(map[&1].runs.len(), 1);
        assert_eq!(map[&2].runs.len(), 1);
        assert_eq!(map[&2].runs[0].start_punch_id, 5);
    }

    #[test]
    fn test_reruns_of_current_stage_are_attempts() {
        let mut map = HashMap::new();
        map.insert(1, attempts(vec![run(1, 0, 50, 1), run(1, 300, 48, 3)]));
        map.insert(2, attempts(vec![run(2, 900, 40, 5)]));

        keep_course_order(&mut map, &[1, 2], 1);

        assert_eq!(map[&1].runs.len(), 2);
        assert_eq!(map[&2].runs.len(), 1);
    }

    #[test]
    fn test_second_lap_needs_repeat() {
        let runs = || {
            let mut map = HashMap::new();
            map.insert(1, attempts(vec![run(1, 0, 50, 1), run(1, 1200, 52, 7)]));
            map.insert(2, attempts(vec![run(2, 600, 40, 3), run(2, 1800, 41, 9)]));
            map
        };

        let mut single = runs();
        keep_course_order(&mut single, &[1, 2], 1);
        assert_eq!(single[&1].runs.len(), 1);
        assert_eq!(single[&2].runs.len(), 1);

        let mut double = runs();
        keep_course_order(&mut double, &[1, 2], 2);
        assert_eq!(double[&1].runs.len(), 2);
        assert_eq!(double[&2].runs.len(), 2);
    }

    mod race {
        use super::super::overall;
        use crate::dto::results::ResultStatus;
        use crate::services::testing::{CourseSpec, Fixture, StageSpec};

        #[tokio::test]
        async fn test_untimed_stage_is_not_required() {
            let fx = Fixture::build(
                &[StageSpec::timed(1, None), StageSpec::untimed(), StageSpec::timed(1, None)],
                CourseSpec::in_order(3),
            )
            .await;
            fx.entrant(101, "8001").await;

            fx.ride("8001", 0, "10:00:00.0", "10:02:00.0").await;
            fx.ride("8001", 2, "11:00:00.0", "11:01:30.5").await;

            let rows = overall(&fx.db, fx.event_id, None).await.unwrap();
            assert_eq!(rows[0].status, ResultStatus::Ok);
            assert_eq!(rows[0].total_ms, Some(210_500));
            assert_eq!(rows[0].total.as_deref(), Some("3:30.5"));
            assert_eq!(rows[0].stages.len(), 2);
        }

        #[tokio::test]
        async fn test_missing_stage_is_dnf_and_no_start_is_dns() {
            let fx = Fixture::build(
                &[StageSpec::timed(1, None), StageSpec::timed(1, None)],
                CourseSpec::in_order(2),
            )
            .await;
            fx.entrant(101, "8001").await;
            fx.entrant(102, "8002").await;
            fx.entrant(103, "8003").await;

            fx.ride("8001", 0, "10:00:00.0", "10:02:00.0").await;
            fx.ride("8001", 1, "10:30:00.0", "10:31:00.0").await;
            fx.ride("8002", 0, "10:05:00.0", "10:06:00.0").await;

            let rows = overall(&fx.db, fx.event_id, None).await.unwrap();
            let status: Vec<(i64, ResultStatus, Option<u32>)> =
                rows.iter().map(|r| (r.bib, r.status, r.rank)).collect();
            assert_eq!(
                status,
                vec![
                    (101, ResultStatus::Ok, Some(1)),
                    (102, ResultStatus::Dnf, None),
                    (103, ResultStatus::Dns, None),
                ]
            );
        }

        #[tokio::test]
        async fn test_laps_count_only_with_repeat() {
            let course = |allow_repeat| CourseSpec {
                laps: 2,
                stages_any_order: false,
                allow_repeat,
                order: vec![0],
            };

            for (allow_repeat, expected) in [(false, Some(50_000)), (true, Some(105_000))] {
                let fx = Fixture::build(&[StageSpec::timed(1, None)], course(allow_repeat)).await;
                fx.entrant(101, "8001").await;
                fx.ride("8001", 0, "10:00:00.0", "10:00:55.0").await;
                fx.ride("8001", 0, "10:10:00.0", "10:10:50.0").await;

                let rows = overall(&fx.db, fx.event_id, None).await.unwrap();
                assert_eq!(rows[0].status, ResultStatus::Ok);
                assert_eq!(rows[0].total_ms, expected);
            }
        }

        #[tokio::test]
        async fn test_any_order_accepts_reversed_stages() {
            let spec = |stages_any_order| CourseSpec {
                laps: 1,
                stages_any_order,
                allow_repeat: false,
                order: vec![0, 1],
            };

            for (any_order, expected) in [(true, ResultStatus::Ok), (false, ResultStatus::Dnf)] {
                let fx = Fixture::build(
                    &[StageSpec::timed(1, None), StageSpec::timed(1, None)],
                    spec(any_order),
                )
                .await;
                fx.entrant(101, "8001").await;
                fx.ride("8001", 1, "10:00:00.0", "10:01:00.0").await;
                fx.ride("8001", 0, "10:30:00.0", "10:31:00.0").await;

                let rows = overall(&fx.db, fx.event_id, None).await.unwrap();
                assert_eq!(rows[0].status, expected);
            }
        }

        #[tokio::test]
        async fn test_tied_totals_share_rank() {
            let fx = Fixture::single_stage(1, None).await;
            fx.entrant(101, "8001").await;
            fx.entrant(102, "8002").await;
            fx.entrant(103, "8003").await;

            fx.ride("8002", 0, "10:00:00.0", "10:01:00.0").await;
            fx.ride("8001", 0, "10:05:00.0", "10:06:00.0").await;
            fx.ride("8003", 0, "10:10:00.0", "10:11:01.0").await;

            let rows = overall(&fx.db, fx.event_id, None).await.unwrap();
            let ranks: Vec<(i64, Option<u32>)> = rows.iter().map(|r| (r.bib, r.rank)).collect();
            assert_eq!(ranks, vec![(102, Some(1)), (101, Some(1)), (103, Some(3))]);
            assert_eq!(rows[2].behind.as_deref(), Some("+0:01.0"));
        }
    }
}
