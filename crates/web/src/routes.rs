use axum::{Router, routing::get};

use crate::features;
use crate::state::AppState;
use crate::ws::ws_handler;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(features::events::routes())
        .merge(features::course_model::routes())
        .merge(features::entries::routes())
        .merge(features::punches::routes())
        .merge(features::results::routes())
        .merge(features::race::routes())
        .merge(features::bridge::routes())
        .merge(features::backups::routes())
        .merge(features::audit::routes());

    Router::new()
        .nest("/api", api)
        .route("/ws", get(ws_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::state::test_state;
    use crate::testing::seed_event;

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    async fn punch(app: &Router, event_id: i64, siac: &str, code: i64, time: &str) -> (StatusCode, Value) {
        send(
            app,
            Method::POST,
            &format!("/api/events/{event_id}/punches"),
            Some(json!({ "siac": siac, "control_code": code, "timestamp": time })),
        )
        .await
    }

    #[tokio::test]
    async fn test_setup_and_timing_over_http() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path()).await);

        let (status, event) = send(
            &app,
            Method::POST,
            "/api/events",
            Some(json!({ "name": "Spring Enduro", "event_date": "2025-06-14" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(event["status"], "setup");
        let event_id = event["event_id"].as_i64().unwrap();
        let base = format!("/api/events/{event_id}");

        let (_, start) = send(
            &app,
            Method::POST,
            &format!("{base}/controls"),
            Some(json!({ "code": 31, "name": "Start", "control_type": "start" })),
        )
        .await;
        let (_, finish) = send(
            &app,
            Method::POST,
            &format!("{base}/controls"),
            Some(json!({ "code": 32, "name": "Finish", "control_type": "finish" })),
        )
        .await;
        let (status, stage) = send(
            &app,
            Method::POST,
            &format!("{base}/stages"),
            Some(json!({
                "stage_number": 1,
                "name": "Ridge",
                "start_control_id": start["control_id"],
                "finish_control_id": finish["control_id"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let stage_id = stage["stage_id"].as_i64().unwrap();

        let (status, course) = send(
            &app,
            Method::POST,
            &format!("{base}/courses"),
            Some(json!({ "name": "Long", "stage_ids": [stage_id] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(course["stage_ids"], json!([stage_id]));

        let (_, class) = send(
            &app,
            Method::POST,
            &format!("{base}/classes"),
            Some(json!({ "name": "Open", "course_id": course["course_id"] })),
        )
        .await;
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("{base}/entries"),
            Some(json!({
                "bib": 7,
                "first_name": "Ada",
                "last_name": "Rider",
                "class_id": class["class_id"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("{base}/chips"),
            Some(json!({ "bib": 7, "siac": "8001" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send(&app, Method::POST, &format!("{base}/activate"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, outcome) = punch(&app, event_id, "8001", 31, "10:00:00.0").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(outcome["status"], "accepted");

        let (_, outcome) = punch(&app, event_id, "8001", 32, "10:02:05.0").await;
        assert_eq!(outcome["stage_result"]["elapsed"], "2:05.0");

        let (_, outcome) = punch(&app, event_id, "8001", 32, "10:02:07.0").await;
        assert_eq!(outcome["status"], "duplicate");

        let (status, results) =
            send(&app, Method::GET, &format!("{base}/stages/{stage_id}/results"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(results[0]["rank"], 1);
        assert_eq!(results[0]["elapsed_ms"], 125_000);

        let (_, standings) = send(&app, Method::GET, &format!("{base}/standings"), None).await;
        assert_eq!(standings["frozen"], false);
        assert_eq!(standings["results"][0]["total"], "2:05.0");

        let (_, duplicates) =
            send(&app, Method::GET, &format!("{base}/punches?duplicate=true"), None).await;
        assert_eq!(duplicates.as_array().unwrap().len(), 1);

        let (_, audit) = send(&app, Method::GET, &format!("/api/audit?event_id={event_id}"), None).await;
        let actions: Vec<&str> = audit
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|entry| entry["action"].as_str())
            .collect();
        assert!(actions.contains(&"control.create"));
        assert!(actions.contains(&"chip.create"));
        assert!(actions.contains(&"event.activate"));
        assert!(actions.contains(&"punch.create"));
    }

    #[tokio::test]
    async fn test_referenced_control_cannot_be_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let seeded = seed_event(&state).await;
        let app = router(state);
        let base = format!("/api/events/{}", seeded.event_id);

        let (_, controls) = send(&app, Method::GET, &format!("{base}/controls"), None).await;
        let control_id = controls[0]["control_id"].as_i64().unwrap();

        let (status, body) =
            send(&app, Method::DELETE, &format!("{base}/controls/{control_id}"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("stage"));

        let (status, _) = send(&app, Method::GET, &format!("{base}/controls/{control_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, Method::GET, &format!("{base}/stages/{}", seeded.stage_id), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_errors_name_the_offending_field() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let seeded = seed_event(&state).await;
        let app = router(state);

        let (status, body) = punch(&app, seeded.event_id, "8001", 99, "10:00:00.0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"][0].as_str().unwrap().starts_with("control_code:"));

        let (status, body) = punch(&app, seeded.event_id, "8001", 31, "ten o'clock").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"][0].as_str().unwrap().starts_with("timestamp:"));

        let (status, body) = punch(&app, seeded.event_id, "", 31, "10:00:00.0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"][0].as_str().unwrap().starts_with("siac:"));

        let (status, _) = send(&app, Method::GET, "/api/events/999/standings", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_lifecycle_is_forward_only() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let seeded = seed_event(&state).await;
        let app = router(state);
        let base = format!("/api/events/{}", seeded.event_id);

        let (status, _) = send(&app, Method::POST, &format!("{base}/finish"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        send(&app, Method::POST, &format!("{base}/activate"), None).await;
        let (status, event) = send(&app, Method::POST, &format!("{base}/finish"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(event["status"], "finished");

        let (status, _) = send(&app, Method::POST, &format!("{base}/activate"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = punch(&app, seeded.event_id, "8001", 31, "10:00:00.0").await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_freeze_holds_published_standings() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let seeded = seed_event(&state).await;
        let app = router(state);
        let base = format!("/api/events/{}", seeded.event_id);

        punch(&app, seeded.event_id, "8001", 31, "10:00:00.0").await;

        let (status, race_state) =
            send(&app, Method::POST, &format!("{base}/standings/freeze"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(race_state["standings_frozen"], true);

        let (_, outcome) = punch(&app, seeded.event_id, "8001", 32, "10:01:00.0").await;
        assert_eq!(outcome["status"], "accepted");

        let (_, frozen) = send(&app, Method::GET, &format!("{base}/standings"), None).await;
        assert_eq!(frozen["frozen"], true);
        assert_eq!(frozen["results"][0]["status"], "dnf");

        let (_, live) = send(&app, Method::GET, &format!("{base}/standings?live=true"), None).await;
        assert_eq!(live["results"][0]["status"], "ok");

        send(&app, Method::POST, &format!("{base}/standings/unfreeze"), None).await;
        let (_, current) = send(&app, Method::GET, &format!("{base}/standings"), None).await;
        assert_eq!(current["frozen"], false);
        assert_eq!(current["results"][0]["total"], "1:00.0");
    }

    #[tokio::test]
    async fn test_paused_punches_wait_for_resume() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let seeded = seed_event(&state).await;
        let app = router(state);
        let base = format!("/api/events/{}", seeded.event_id);

        send(&app, Method::POST, &format!("{base}/ingest/pause"), None).await;

        let (status, outcome) = punch(&app, seeded.event_id, "8001", 31, "10:00:00.0").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(outcome["status"], "deferred");
        punch(&app, seeded.event_id, "8001", 32, "10:00:45.0").await;

        let (_, race_state) = send(&app, Method::GET, &format!("{base}/race-state"), None).await;
        assert_eq!(race_state["deferred_punches"], 2);

        let (status, resumed) = send(&app, Method::POST, &format!("{base}/ingest/resume"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resumed["processed"], 2);
        assert_eq!(resumed["ingest_paused"], false);

        let (_, results) = send(
            &app,
            Method::GET,
            &format!("{base}/stages/{}/results", seeded.stage_id),
            None,
        )
        .await;
        assert_eq!(results[0]["elapsed"], "0:45.0");
    }

    #[tokio::test]
    async fn test_csv_import_reports_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let seeded = seed_event(&state).await;
        let app = router(state);

        let csv = "bib,first_name,last_name,club,class\n\
                   12,Bea,Climb,,Open\n\
                   13,Cy,Drop,,Juniors\n\
                   x,Bad,Row,,Open\n";
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/events/{}/entries/import/csv", seeded.event_id))
            .header("content-type", "text/csv")
            .body(Body::from(csv))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let report: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(report["imported"], 1);
        assert_eq!(report["warnings"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_backup_restore_requires_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let seeded = seed_event(&state).await;
        let app = router(state);

        let (status, backup) = send(
            &app,
            Method::POST,
            "/api/backups",
            Some(json!({ "label": "before start" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let filename = backup["filename"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/backups/restore",
            Some(json!({ "filename": filename })),
        )
        .await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);

        send(
            &app,
            Method::DELETE,
            &format!("/api/events/{}/entries/1", seeded.event_id),
            None,
        )
        .await;

        let (status, counts) = send(
            &app,
            Method::POST,
            "/api/backups/restore",
            Some(json!({ "filename": filename, "confirm": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(counts["entries"], 1);

        let (_, backups) = send(&app, Method::GET, "/api/backups", None).await;
        assert_eq!(backups.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bridge_stop_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let seeded = seed_event(&state).await;
        let app = router(state);
        let base = format!("/api/events/{}/bridge", seeded.event_id);

        let (status, first) = send(&app, Method::POST, &format!("{base}/stop"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["running"], false);

        let (status, second) = send(&app, Method::POST, &format!("{base}/stop"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["status"]["state"], "stopped");

        let (status, _) = send(&app, Method::POST, &format!("{base}/start"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_chip_update_and_delete_keep_one_primary() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path()).await;
        let seeded = seed_event(&state).await;
        let app = router(state);
        let base = format!("/api/events/{}", seeded.event_id);

        let (status, replacement) = send(
            &app,
            Method::POST,
            &format!("{base}/chips"),
            Some(json!({ "bib": 101, "siac": "8101", "is_primary": true })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let primaries = |chips: &Value| -> Vec<String> {
            chips
                .as_array()
                .unwrap()
                .iter()
                .filter(|c| c["is_primary"] == true)
                .map(|c| c["siac"].as_str().unwrap().to_string())
                .collect()
        };

        let (_, chips) = send(&app, Method::GET, &format!("{base}/chips"), None).await;
        let original = chips
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["siac"] == "8001")
            .unwrap()["chip_id"]
            .clone();

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("{base}/chips/{original}"),
            Some(json!({ "is_primary": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["is_primary"], true);
        let (_, chips) = send(&app, Method::GET, &format!("{base}/chips"), None).await;
        assert_eq!(primaries(&chips), vec!["8001".to_string()]);

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("{base}/chips/{original}"),
            Some(json!({ "siac": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::DELETE, &format!("{base}/chips/{original}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, chips) = send(&app, Method::GET, &format!("{base}/chips"), None).await;
        assert_eq!(primaries(&chips), vec!["8101".to_string()]);
        assert_eq!(chips[0]["chip_id"], replacement["chip_id"]);

        let (_, audit) = send(&app, Method::GET, &format!("/api/audit?event_id={}", seeded.event_id), None).await;
        let actions: Vec<&str> = audit
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|entry| entry["action"].as_str())
            .collect();
        assert!(actions.contains(&"chip.update"));
        assert!(actions.contains(&"chip.delete"));
    }
}
