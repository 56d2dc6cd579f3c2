//! End-to-end pipeline execution scenarios

mod helpers;

use dossier::events::types;
use dossier::{
    ActivityRegistry, EngineError, ExecutionStatus, PipelineRunner, PipelineSpec, StepDispatcher,
    StepError,
};
use helpers::{sample_twitter_result, CollectingPublisher, ScriptedActivity};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn runner_with(
    activity: ScriptedActivity,
    publisher: Arc<CollectingPublisher>,
) -> PipelineRunner<ScriptedActivity> {
    let dispatcher = StepDispatcher::new(ActivityRegistry::builtin(), activity)
        .with_backoff(Duration::from_millis(1), Duration::from_millis(5));
    PipelineRunner::new(dispatcher, publisher)
}

/// A crawl feeds an ML step through a wildcard template; results accumulate
/// under step ids and events fire in order.
#[tokio::test]
async fn test_success_chain_threads_outputs() {
    let yaml = r#"
pipeline_id: "investigate-alice"
workspace_id: "ws-1"
steps:
  - id: "twitter"
    type: "crawler"
    method: "crawler_twitter_profile"
    inputs:
      username: "alice_crypto"
  - id: "sentiment"
    type: "ml_model"
    model: "sentiment_analysis_v2"
    inputs:
      texts:
        from: "{{twitter.recent_posts[*].text}}"
"#;
    let spec = PipelineSpec::from_yaml(yaml).unwrap();

    let activity = ScriptedActivity::new()
        .respond("crawl_twitter", sample_twitter_result())
        .respond(
            "run_sentiment_analysis",
            json!({"results": [{"label": "positive", "score": 0.9}]}),
        );
    let publisher = Arc::new(CollectingPublisher::new());
    let runner = runner_with(activity, publisher.clone());

    let run = runner.run(&spec).await.unwrap();

    assert_eq!(run.status, ExecutionStatus::Completed);
    assert_eq!(run.results["twitter"]["username"], json!("alice_crypto"));
    assert!(run.results.contains_key("sentiment"));

    // The ML step received the extracted post texts, not the template.
    let dispatcher_inputs = runner_inputs(&runner, "run_sentiment_analysis");
    assert_eq!(
        dispatcher_inputs["texts"],
        json!([
            "First tweet about crypto",
            "Second tweet about NFTs",
            "Third tweet about DeFi",
        ])
    );

    assert_eq!(
        publisher.event_types(),
        vec![
            types::EXECUTION_STARTED,
            types::STEP_STARTED,
            types::STEP_COMPLETED,
            types::STEP_STARTED,
            types::STEP_COMPLETED,
            types::PIPELINE_COMPLETED,
        ]
    );

    let completed = publisher.payloads_of(types::PIPELINE_COMPLETED);
    assert_eq!(completed.len(), 1);
    assert!(completed[0]["results"]["sentiment"].is_object());
    assert!(completed[0].contains_key("timestamp"));
}

fn runner_inputs(
    runner: &PipelineRunner<ScriptedActivity>,
    activity: &str,
) -> serde_json::Map<String, serde_json::Value> {
    // PipelineRunner owns the dispatcher which owns the activity; reach the
    // recorded calls through the helper accessors.
    runner.activities().last_inputs(activity).unwrap()
}

/// Three steps; step 2 exhausts its 3 attempts. Step 3 never runs, exactly
/// one step.failed event fires, and the error names step 2.
#[tokio::test]
async fn test_fail_fast_aborts_remaining_steps() {
    let yaml = r#"
pipeline_id: "p"
workspace_id: "w"
steps:
  - id: "step1"
    type: "crawler"
    method: "crawler_twitter_profile"
    inputs:
      username: "alice"
  - id: "step2"
    type: "function"
    method: "breach_db_lookup"
    inputs:
      email: "alice@example.com"
  - id: "step3"
    type: "crawler"
    method: "crawler_facebook_profile"
"#;
    let spec = PipelineSpec::from_yaml(yaml).unwrap();

    let activity = ScriptedActivity::new()
        .respond("crawl_twitter", sample_twitter_result())
        .fail_always("lookup_breach_db", "connection refused");
    let publisher = Arc::new(CollectingPublisher::new());
    let runner = runner_with(activity, publisher.clone());

    let err = runner.run(&spec).await.unwrap_err();
    match err {
        EngineError::StepFailed { step_id, source } => {
            assert_eq!(step_id, "step2");
            assert!(matches!(source, StepError::Dispatch(_)));
        }
        other => panic!("expected StepFailed, got {other:?}"),
    }

    // Default retry budget: 3 attempts against the failing activity.
    assert_eq!(runner.activities().call_count("lookup_breach_db"), 3);
    // Fail-fast: step 3 is never dispatched.
    assert_eq!(runner.activities().call_count("crawl_facebook"), 0);

    let failed = publisher.payloads_of(types::STEP_FAILED);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["step_id"], json!("step2"));

    // No terminal completion event after an abort.
    assert!(publisher.payloads_of(types::PIPELINE_COMPLETED).is_empty());
}

/// A resolution error fails the step without ever calling the activity and
/// without retries.
#[tokio::test]
async fn test_resolution_error_is_not_retried() {
    let yaml = r#"
pipeline_id: "p"
workspace_id: "w"
steps:
  - id: "sentiment"
    type: "ml_model"
    model: "sentiment_analysis_v2"
    inputs:
      texts:
        from: "{{ghost.recent_posts[*].text}}"
"#;
    let spec = PipelineSpec::from_yaml(yaml).unwrap();

    let activity = ScriptedActivity::new();
    let publisher = Arc::new(CollectingPublisher::new());
    let runner = runner_with(activity, publisher.clone());

    let err = runner.run(&spec).await.unwrap_err();
    match err {
        EngineError::StepFailed { step_id, source } => {
            assert_eq!(step_id, "sentiment");
            assert!(matches!(source, StepError::Resolve(_)));
            assert!(source.to_string().contains("ghost"));
        }
        other => panic!("expected StepFailed, got {other:?}"),
    }

    assert_eq!(runner.activities().call_count("run_sentiment_analysis"), 0);
    assert_eq!(publisher.payloads_of(types::STEP_FAILED).len(), 1);
}

/// Placeholder step kinds resolve to their markers without external calls.
#[tokio::test]
async fn test_placeholder_steps_produce_markers() {
    let yaml = r#"
pipeline_id: "p"
workspace_id: "w"
steps:
  - id: "check"
    type: "validation"
  - id: "report"
    type: "output"
  - id: "reshape"
    type: "data_transform"
"#;
    let spec = PipelineSpec::from_yaml(yaml).unwrap();

    let publisher = Arc::new(CollectingPublisher::new());
    let runner = runner_with(ScriptedActivity::new(), publisher);

    let run = runner.run(&spec).await.unwrap();
    assert_eq!(run.results["check"], json!({"status": "passed"}));
    assert_eq!(run.results["report"], json!({"status": "generated"}));
    assert_eq!(run.results["reshape"]["status"], json!("skipped"));
}

/// Event publishing is best-effort: a broken channel never fails the run.
#[tokio::test]
async fn test_publish_failures_do_not_abort_the_run() {
    let yaml = r#"
pipeline_id: "p"
workspace_id: "w"
steps:
  - id: "lookup"
    type: "function"
    method: "breach_db_lookup"
    inputs:
      email: "alice@example.com"
"#;
    let spec = PipelineSpec::from_yaml(yaml).unwrap();

    let activity = ScriptedActivity::new().respond("lookup_breach_db", json!({"breaches": []}));
    let publisher = Arc::new(CollectingPublisher::failing());
    let runner = runner_with(activity, publisher.clone());

    let run = runner.run(&spec).await.unwrap();
    assert_eq!(run.status, ExecutionStatus::Completed);

    // Every event was still attempted in order.
    assert_eq!(
        publisher.event_types(),
        vec![
            types::EXECUTION_STARTED,
            types::STEP_STARTED,
            types::STEP_COMPLETED,
            types::PIPELINE_COMPLETED,
        ]
    );
}

/// A cancelled run stops at the next step boundary.
#[tokio::test]
async fn test_cancellation_stops_between_steps() {
    let yaml = r#"
pipeline_id: "p"
workspace_id: "w"
steps:
  - id: "first"
    type: "function"
    method: "breach_db_lookup"
  - id: "second"
    type: "function"
    method: "breach_db_lookup"
"#;
    let spec = PipelineSpec::from_yaml(yaml).unwrap();

    let activity = ScriptedActivity::new().respond("lookup_breach_db", json!({"breaches": []}));
    let publisher = Arc::new(CollectingPublisher::new());
    let runner = runner_with(activity, publisher.clone());

    // Flag is set before the run starts, so even the first step is skipped.
    let cancel = runner.cancel_flag();
    cancel.store(true, std::sync::atomic::Ordering::SeqCst);

    let err = runner.run(&spec).await.unwrap_err();
    assert!(matches!(err, EngineError::Cancelled));
    assert_eq!(runner.activities().call_count("lookup_breach_db"), 0);
}
