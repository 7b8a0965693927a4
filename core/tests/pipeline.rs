use std::time::{Duration, Instant};

use rebench_core::action::build_pipeline;
use rebench_core::config::BenchConfig;
use rebench_core::dataset::Dataset;
use rebench_core::engine::EngineKind;
use rebench_core::exploit::PumpSpec;
use rebench_core::testing::{
    run_bounded, BoundedExecutor, ErrorKind, Outcome, TestCase, TimeUnit,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn cases_from_json(v: serde_json::Value) -> Vec<TestCase> {
    serde_json::from_value(v).unwrap()
}

#[tokio::test]
async fn batch_of_mixed_cases() {
    let cases = cases_from_json(json!([
        {"pattern": "(a|aa)*b", "string": "aaaaaaaaaaaab"},
        {"pattern": "(a|a)*c", "exploitString": {
            "degree": 0, "separators": [""], "pumps": ["a"], "suffix": "!"
        }},
        {"pattern": "x(y|z)*", "exploitString": {
            "degree": 2, "separators": ["x", "-"], "pumps": ["y", "z"], "suffix": "\n",
            "exampleString": "xyyy-zzz\n"
        }},
        {"pattern": "a{", "input": "a{"},
        {"pattern": "[[:alpha:]", "string": ""},
    ]));
    let cfg = BenchConfig {
        time_unit: TimeUnit::Millis,
        pump_repeat: 8,
        ..BenchConfig::default()
    };
    let pipeline = build_pipeline(&cfg, CancellationToken::new());
    let reports = pipeline.run_all(&cases, Duration::from_secs(10), false).await;

    assert_eq!(reports.len(), cases.len());
    let exploits: Vec<&str> = reports.iter().map(|r| r.exploit.as_str()).collect();
    assert_eq!(
        exploits,
        vec!["aaaaaaaaaaaab", "a...a!", "xy...y-z...z\\x0a", "a{", ""]
    );
    assert_eq!(reports[0].error(), None);
    assert_eq!(reports[1].error(), None);
    assert_eq!(reports[2].error(), None);
    assert_eq!(reports[4].error(), Some(ErrorKind::Execution));
    for r in &reports[..3] {
        assert!(r.time().is_some(), "{}", r);
    }
}

#[tokio::test]
async fn every_engine_handles_an_exploit() {
    let t = TestCase::with_exploit("(a|aa)*b", PumpSpec::eda("", "a", "c"));
    for engine in [EngineKind::Meta, EngineKind::Backtrack, EngineKind::PikeVm] {
        let cfg = BenchConfig {
            engine,
            pump_repeat: 64,
            ..BenchConfig::default()
        };
        let pipeline = build_pipeline(&cfg, CancellationToken::new());
        let reports = pipeline
            .run_all(std::slice::from_ref(&t), Duration::from_secs(10), false)
            .await;
        assert_eq!(reports[0].error(), None, "{}", engine);
        assert!(reports[0].to_string().starts_with("regex: (a|aa)*b\nexploit: a...ac\n"));
    }
}

#[tokio::test]
async fn timed_out_case_does_not_slow_the_next_one() {
    let timeout = Duration::from_millis(150);
    let executor = BoundedExecutor::new();

    let start = Instant::now();
    let first = executor
        .run(
            |_| loop {
                std::hint::spin_loop();
            },
            timeout,
        )
        .await;
    assert_eq!(first, Outcome::TimedOut);
    assert!(start.elapsed() < timeout + Duration::from_millis(500));

    let second = run_bounded(
        |_| {
            std::thread::sleep(Duration::from_millis(20));
            Ok(None)
        },
        timeout,
    )
    .await;
    let Outcome::Completed { elapsed, .. } = second else {
        panic!("unexpected outcome: {:?}", second)
    };
    assert!(elapsed >= Duration::from_millis(20));
    assert!(elapsed < timeout);
}

#[tokio::test]
async fn interrupt_marks_remaining_cases() {
    let token = CancellationToken::new();
    token.cancel();
    let pipeline = build_pipeline(&BenchConfig::default(), token);
    let cases = vec![TestCase::new("a", "a"), TestCase::new("b", "b")];
    let reports = pipeline.run_all(&cases, Duration::from_secs(1), false).await;
    assert_eq!(reports.len(), 2);
    for r in &reports {
        assert_eq!(r.recorded_value().as_deref(), Some("InterruptedException"));
    }
}

#[test]
fn invalid_dataset_aborts_before_running() {
    let d = Dataset::from_entries(
        "bad.json",
        vec![json!({"pattern": "a", "exploitString": {"degree": 2, "separators": ["a"], "pumps": ["b"], "suffix": ""}})],
    );
    assert!(d.testcases().is_err());
}
