use super::*;

fn voters_body() -> serde_json::Value {
    serde_json::json!({
        "kind": "voters",
        "format": "spreadsheet",
        "filters": { "codigo_estado": "05", "codigo_municipio": "" }
    })
}

#[tokio::test]
async fn test_start_export_runs_to_completion() {
    let resolver = ScriptedResolver::parts(2);
    let (orchestrator, app, _temp_dir) = create_test_app(
        resolver.clone(),
        Arc::new(ScriptedFetcher::new()),
        Arc::new(RecordingSink::new()),
    );

    let response = app
        .clone()
        .oneshot(post_json("/exports", voters_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = json_body(response).await;
    assert_eq!(body["run_id"], 1);

    wait_until_idle(&orchestrator).await;

    let request = resolver.requests.lock().unwrap()[0].clone();
    assert_eq!(request.kind, crate::types::ExportKind::Voters);
    assert_eq!(request.filters.get("codigo_estado").map(String::as_str), Some("05"));

    let response = app.oneshot(get_request("/exports/result")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = json_body(response).await;
    assert_eq!(outcome["run_id"], 1);
    assert_eq!(outcome["status"]["status"], "completed");
    assert_eq!(outcome["status"]["total_parts"], 2);
}

#[tokio::test]
async fn test_start_export_while_running_is_conflict() {
    let gate = Gate::at(1);
    let entered = gate.entered.clone();
    let release = gate.release.clone();
    let (orchestrator, app, _temp_dir) = create_test_app(
        ScriptedResolver::parts(2),
        Arc::new(ScriptedFetcher::new().with_gate(gate)),
        Arc::new(RecordingSink::new()),
    );

    let response = app
        .clone()
        .oneshot(post_json("/exports", voters_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    entered.notified().await;

    let response = app
        .clone()
        .oneshot(post_json("/exports", voters_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ApiError = serde_json::from_value(json_body(response).await).unwrap();
    assert_eq!(error.error.code, "already_running");

    release.notify_one();
    wait_until_idle(&orchestrator).await;
}

#[tokio::test]
async fn test_cancel_endpoint_stops_run_between_parts() {
    let gate = Gate::at(1);
    let entered = gate.entered.clone();
    let release = gate.release.clone();
    let sink = Arc::new(RecordingSink::new());
    let (orchestrator, app, _temp_dir) = create_test_app(
        ScriptedResolver::parts(3),
        Arc::new(ScriptedFetcher::new().with_gate(gate)),
        sink.clone(),
    );

    app.clone()
        .oneshot(post_json("/exports", voters_body()))
        .await
        .unwrap();
    entered.notified().await;

    let response = app
        .clone()
        .oneshot(post_json("/exports/cancel", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    release.notify_one();
    wait_until_idle(&orchestrator).await;
    assert_eq!(sink.saved_indices(), vec![1]);

    let response = app.oneshot(get_request("/exports/progress")).await.unwrap();
    let progress = json_body(response).await;
    assert_eq!(progress["status"]["state"], "cancelled");
    assert_eq!(progress["current_part"], 1);
}

#[tokio::test]
async fn test_cancel_when_idle_is_conflict() {
    let (_orchestrator, app, _temp_dir) = default_test_app();

    let response = app
        .oneshot(post_json("/exports/cancel", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"]["code"], "not_running");
}

#[tokio::test]
async fn test_result_before_any_run_is_not_found() {
    let (_orchestrator, app, _temp_dir) = default_test_app();

    let response = app.oneshot(get_request("/exports/result")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failed_run_result_carries_part_and_message() {
    let (orchestrator, app, _temp_dir) = create_test_app(
        ScriptedResolver::parts(3),
        Arc::new(ScriptedFetcher::new().fail_at(
            3,
            ExportError::Http {
                status: 500,
                part: Some(3),
            },
        )),
        Arc::new(RecordingSink::new()),
    );

    app.clone()
        .oneshot(post_json("/exports", voters_body()))
        .await
        .unwrap();
    wait_until_idle(&orchestrator).await;

    let outcome = json_body(app.clone().oneshot(get_request("/exports/result")).await.unwrap()).await;
    assert_eq!(outcome["status"]["status"], "failed");
    assert_eq!(outcome["status"]["error"]["kind"], "http");
    assert_eq!(outcome["status"]["error"]["part"], 3);
    assert!(
        outcome["message"]
            .as_str()
            .unwrap()
            .starts_with("Export failed at part 3 of 3")
    );

    let progress = json_body(app.oneshot(get_request("/exports/progress")).await.unwrap()).await;
    assert_eq!(progress["status"]["state"], "failed");
    assert_eq!(progress["percent"], 66.67);
}

#[tokio::test]
async fn test_progress_starts_idle() {
    let (_orchestrator, app, _temp_dir) = default_test_app();

    let response = app.oneshot(get_request("/exports/progress")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let progress = json_body(response).await;
    assert_eq!(progress["status"]["state"], "idle");
    assert_eq!(progress["percent"], 0.0);
}

#[tokio::test]
async fn test_start_export_after_shutdown_is_unavailable() {
    let (orchestrator, app, _temp_dir) = default_test_app();
    orchestrator.shutdown().await.unwrap();

    let response = app
        .oneshot(post_json("/exports", voters_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_start_export_rejects_body_without_kind() {
    let (_orchestrator, app, _temp_dir) = default_test_app();

    let response = app
        .oneshot(post_json("/exports", serde_json::json!({ "format": "text" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
