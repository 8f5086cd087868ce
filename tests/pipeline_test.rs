//! End-to-end pipeline scenarios against a recording process.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{json, Value};

use processify::util::testing::{init_test_setup, RecordingProcess};
use processify::{Arguments, Failure, Processify, RunState, StructuredError};

const SCRIPT: &str = "/home/user/tools/example";

fn defaults() -> Arguments {
    Arguments::new()
        .positional(0, "mode")
        .positional(1, "default answer")
        .named("paramA", 1)
        .named("paramB", 1)
}

/// Sync variant of the example main: answer when params match, native error otherwise.
fn sync_main(args: Arguments) -> Result<Value, Failure> {
    let a = args.get_named("paramA").cloned();
    let b = args.get_named("paramB").cloned();
    if a != b {
        let err = std::io::Error::other(format!(
            "Params {} is different from {}.",
            a.unwrap_or_default(),
            b.unwrap_or_default()
        ));
        return Err(err.into());
    }
    Ok(args.get(1).cloned().unwrap_or_default())
}

#[test]
fn given_sync_mode_with_equal_params_when_run_then_prints_json_and_exits_zero() {
    init_test_setup();
    let ctx = RecordingProcess::launched(
        "/home/user/tools/example.rs",
        &["sync", "42", "--paramA", "1", "--paramB", "1"],
    );

    let state = Processify::new(defaults()).run(&ctx, SCRIPT, sync_main);

    assert_eq!(state, RunState::Exited(0));
    assert_eq!(ctx.stdout(), vec![r#""42""#.to_string()]);
    assert!(ctx.stderr().is_empty());
    assert_eq!(ctx.exit_codes(), vec![0]);
}

#[test]
fn given_sync_mode_with_different_params_when_run_then_stderr_and_exit_one() {
    init_test_setup();
    let ctx = RecordingProcess::launched(SCRIPT, &["sync", "--paramA", "1", "--paramB", "2"]);

    let state = Processify::new(defaults()).run(&ctx, SCRIPT, sync_main);

    assert_eq!(state, RunState::Exited(1));
    assert!(ctx.stdout().is_empty());
    let stderr = ctx.stderr();
    assert_eq!(stderr.len(), 1);
    assert!(stderr[0].contains("Params 1 is different from 2."));
    assert_eq!(ctx.exit_codes(), vec![1]);
}

#[tokio::test]
async fn given_promise_mode_with_success_handler_when_run_then_handler_gets_value() {
    init_test_setup();
    let ctx = RecordingProcess::launched(
        SCRIPT,
        &["promise", "--paramA", "5", "--paramB", "5", "--answer", "ok"],
    );
    let seen: Rc<RefCell<Option<Value>>> = Rc::default();
    let sink = Rc::clone(&seen);

    let state = Processify::new(defaults())
        .on_success(move |value: Value| {
            *sink.borrow_mut() = Some(value);
        })
        .run_async(&ctx, SCRIPT, |args| async move {
            tokio::task::yield_now().await;
            if args.get_named("paramA") == args.get_named("paramB") {
                Ok(args.get_named("answer").cloned().unwrap_or_default())
            } else {
                Err("params differ")
            }
        })
        .await;

    assert_eq!(state, RunState::Exited(0));
    assert_eq!(*seen.borrow(), Some(json!("ok")));
    assert!(ctx.stdout().is_empty());
    assert_eq!(ctx.exit_codes(), vec![0]);
}

#[test]
fn given_structured_error_without_handler_when_run_then_message_and_its_code() {
    let ctx = RecordingProcess::launched(SCRIPT, &[]);

    let state = Processify::<()>::new(defaults())
        .run(&ctx, SCRIPT, |_| Err(StructuredError::new("bad input", 17)));

    assert_eq!(state, RunState::Exited(17));
    assert_eq!(ctx.stderr(), vec!["bad input".to_string()]);
    assert_eq!(ctx.exit_codes(), vec![17]);
}

#[test]
fn given_structured_error_with_handler_when_run_then_handler_code_wins() {
    let ctx = RecordingProcess::launched(SCRIPT, &[]);
    let seen: Rc<RefCell<Option<Failure>>> = Rc::default();
    let sink = Rc::clone(&seen);

    let state = Processify::<()>::new(defaults())
        .on_error(move |failure| {
            *sink.borrow_mut() = Some(failure.clone());
            Some(3)
        })
        .run(&ctx, SCRIPT, |_| Err(StructuredError::new("bad input", 17)));

    assert_eq!(state, RunState::Exited(3));
    assert!(ctx.stderr().is_empty());
    assert_eq!(
        *seen.borrow(),
        Some(Failure::Structured {
            message: "bad input".to_string(),
            code: 17
        })
    );
    assert_eq!(ctx.exit_codes(), vec![3]);
}

#[test]
fn given_other_launch_target_when_run_then_skipped_without_side_effects() {
    let ctx = RecordingProcess::launched("/home/user/tools/other.rs", &["sync", "42"]);
    let mut called = false;

    let state = Processify::new(defaults()).run(&ctx, SCRIPT, |args| {
        called = true;
        sync_main(args)
    });

    assert_eq!(state, RunState::Skipped);
    assert!(!called);
    assert!(ctx.stdout().is_empty());
    assert!(ctx.stderr().is_empty());
    assert!(ctx.exit_codes().is_empty());
}

#[test]
fn given_missing_launch_path_when_run_blocking_then_skipped() {
    let ctx = RecordingProcess::new(None, &["sync"]);

    let state = Processify::<Value>::new(defaults())
        .run_blocking(&ctx, SCRIPT, |_| async { Ok::<_, Failure>(Value::Null) });

    assert_eq!(state, RunState::Skipped);
    assert!(ctx.exit_codes().is_empty());
}

#[test]
fn given_string_rejection_when_run_blocking_then_stderr_and_exit_one() {
    let ctx = RecordingProcess::launched(SCRIPT, &["promise"]);

    let state = Processify::<Value>::new(defaults()).run_blocking(&ctx, SCRIPT, |_| async {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        Err::<Value, _>("Params 5 is different from 6.")
    });

    assert_eq!(state, RunState::Exited(1));
    assert_eq!(ctx.stderr(), vec!["Params 5 is different from 6.".to_string()]);
}

#[test]
fn given_panic_inside_future_when_run_blocking_then_native_failure() {
    let ctx = RecordingProcess::launched(SCRIPT, &[]);

    let state = Processify::<Value>::new(defaults()).run_blocking(&ctx, SCRIPT, |_| async {
        tokio::task::yield_now().await;
        if true {
            panic!("lost connection");
        }
        Ok::<_, Failure>(Value::Null)
    });

    assert_eq!(state, RunState::Exited(1));
    let stderr = ctx.stderr();
    assert_eq!(stderr.len(), 1);
    assert!(stderr[0].starts_with("panicked at tests/pipeline_test.rs:"));
    assert!(stderr[0].ends_with(": lost connection"));
}

#[test]
fn given_json_error_value_when_run_then_classified_as_structured() {
    let ctx = RecordingProcess::launched(SCRIPT, &[]);

    let state = Processify::<()>::new(defaults())
        .run(&ctx, SCRIPT, |_| Err(json!({"message": "quota exceeded", "code": 4})));

    assert_eq!(state, RunState::Exited(4));
    assert_eq!(ctx.stderr(), vec!["quota exceeded".to_string()]);
}

#[test]
fn given_json_defaults_when_run_then_main_sees_merged_arguments() {
    let ctx = RecordingProcess::launched(SCRIPT, &["sync", "--paramB", "2", "--verbose"]);
    let seen: Rc<RefCell<Option<Arguments>>> = Rc::default();
    let sink = Rc::clone(&seen);

    let processify = Processify::<()>::from_json(json!({
        "0": "mode",
        "1": "default answer",
        "paramA": 1,
        "paramB": 1
    }))
    .unwrap();

    processify.run(&ctx, SCRIPT, move |args| {
        *sink.borrow_mut() = Some(args);
        Ok::<_, Failure>(())
    });

    let args = seen.borrow().clone().unwrap();
    assert_eq!(
        args.to_value(),
        json!({
            "0": "sync",
            "1": "default answer",
            "paramA": 1,
            "paramB": 2,
            "verbose": true
        })
    );
}
