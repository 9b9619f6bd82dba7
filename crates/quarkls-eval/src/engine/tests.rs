//! Unit tests for the evaluation pipeline.

use camino::Utf8PathBuf;
use quarkls_config::EvaluationSettings;
use rstest::{fixture, rstest};

use super::*;
use crate::frame::StackFrame;
use crate::test_support::{RecordingConsole, ScriptedInterpreter};

struct Harness {
    engine: EvaluationEngine<ScriptedInterpreter>,
    console: RecordingConsole,
}

fn harness_with(interpreter: ScriptedInterpreter, settings: EvaluationSettings) -> Harness {
    let console = RecordingConsole::new();
    let engine = EvaluationEngine::new(interpreter, settings).with_console(console.clone());
    Harness { engine, console }
}

fn scripted() -> ScriptedInterpreter {
    ScriptedInterpreter::new()
        .returns("1 + 1", "2")
        .returns("Array.fill(10000, 0)", &"0, ".repeat(10_000))
        .raises(
            "1.foo",
            "Message 'foo' not understood.",
            vec![
                StackFrame::method("DoesNotUnderstandError", "new"),
                StackFrame::method("Integer", "doesNotUnderstand").with_argument("this", "1"),
            ],
        )
        .raises("Error(\"boom\").throw", "boom", Vec::new())
}

#[fixture]
fn harness() -> Harness {
    harness_with(scripted(), EvaluationSettings::default())
}

#[rstest]
fn evaluates_simple_expression(mut harness: Harness) {
    let outcome = harness.engine.evaluate("1 + 1");

    assert_eq!(
        outcome,
        EvaluationOutcome::Success {
            result: String::from("2")
        }
    );
    assert_eq!(harness.console.lines(), ["-> 2"]);
}

#[rstest]
fn truncates_large_results(mut harness: Harness) {
    let outcome = harness.engine.evaluate("Array.fill(10000, 0)");

    let EvaluationOutcome::Success { result } = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert!(result.ends_with(TRUNCATION_MARKER));
    assert_eq!(
        result.chars().count(),
        2000 + TRUNCATION_MARKER.chars().count()
    );
}

#[rstest]
fn compile_error_executes_nothing_and_posts_nothing() {
    let settings = EvaluationSettings {
        post_before_marker: true,
        post_after_marker: true,
        ..EvaluationSettings::default()
    };
    let mut harness = harness_with(scripted(), settings);

    let outcome = harness.engine.evaluate("1 +");

    assert_eq!(
        outcome,
        EvaluationOutcome::CompileError {
            message: String::from(COMPILE_ERROR_MESSAGE)
        }
    );
    assert!(harness.console.lines().is_empty());
}

#[rstest]
fn runtime_error_skips_constructor_frame(mut harness: Harness) {
    let outcome = harness.engine.evaluate("1.foo");

    let EvaluationOutcome::EvaluationError { message, backtrace } = outcome else {
        panic!("expected evaluation error, got {outcome:?}");
    };
    assert_eq!(message, "Message 'foo' not understood.");
    let report = backtrace.expect("enriched reports are enabled by default");
    assert_eq!(report.skipped_frames(), 1);
    assert_eq!(report.entries().len(), 1);

    let lines = harness.console.lines();
    assert_eq!(
        lines.first().map(String::as_str),
        Some("ERROR: Message 'foo' not understood.")
    );
    assert!(lines.iter().any(|line| line == "Integer:doesNotUnderstand"));
    assert!(lines.iter().any(|line| line == "    this = 1"));
}

#[rstest]
fn raising_in_root_yields_empty_backtrace(mut harness: Harness) {
    let outcome = harness.engine.evaluate("Error(\"boom\").throw");

    let EvaluationOutcome::EvaluationError { backtrace, .. } = outcome else {
        panic!("expected evaluation error, got {outcome:?}");
    };
    let report = backtrace.expect("enriched reports are enabled by default");
    assert_eq!(report.skipped_frames(), 0);
    assert!(report.entries().is_empty());
}

#[rstest]
fn plain_error_reports_omit_backtrace(mut harness: Harness) {
    let settings = EvaluationSettings {
        improved_error_reports: false,
        ..EvaluationSettings::default()
    };
    harness.engine.set_settings(settings);

    let outcome = harness.engine.evaluate("1.foo");

    assert!(matches!(
        outcome,
        EvaluationOutcome::EvaluationError {
            backtrace: None,
            ..
        }
    ));
    assert_eq!(harness.console.lines(), ["ERROR: Message 'foo' not understood."]);
}

#[rstest]
fn markers_and_prefix_follow_settings() {
    let settings = EvaluationSettings {
        post_before_marker: true,
        post_after_marker: true,
        result_prefix: String::from("=> "),
        ..EvaluationSettings::default()
    };
    let mut harness = harness_with(scripted(), settings);

    harness.engine.evaluate("1 + 1");

    assert_eq!(harness.console.lines(), [BEFORE_MARKER, "=> 2", AFTER_MARKER]);
}

#[rstest]
fn results_are_not_posted_when_disabled() {
    let settings = EvaluationSettings {
        post_results: false,
        ..EvaluationSettings::default()
    };
    let mut harness = harness_with(scripted(), settings);

    let outcome = harness.engine.evaluate("1 + 1");

    assert!(outcome.is_success());
    assert!(harness.console.lines().is_empty());
}

#[rstest]
fn preprocessor_rewrites_source_before_compiling() {
    let interpreter = scripted();
    let journal = interpreter.journal();
    let console = RecordingConsole::new();
    let mut engine = EvaluationEngine::new(interpreter, EvaluationSettings::default())
        .with_console(console)
        .with_preprocessor(|source| source.trim().to_owned());

    let outcome = engine.evaluate("  1 + 1\n");

    assert!(outcome.is_success());
    assert_eq!(journal.compiled(), ["1 + 1"]);
}

#[rstest]
fn executing_path_is_published_then_cleared(mut harness: Harness) {
    let journal = harness.engine.interpreter().journal();
    let path = Utf8PathBuf::from("/work/main.scd");

    harness.engine.evaluate_in(Some(&path), "1 + 1");

    assert_eq!(journal.executing_paths(), [Some(path), None]);
}

#[rstest]
fn outcomes_serialise_to_wire_shapes(mut harness: Harness) {
    let success = serde_json::to_value(harness.engine.evaluate("1 + 1")).expect("serialise");
    let compile = serde_json::to_value(harness.engine.evaluate("1 +")).expect("serialise");
    let failure = serde_json::to_value(harness.engine.evaluate("1.foo")).expect("serialise");

    assert_eq!(success, serde_json::json!({ "result": "2" }));
    assert_eq!(compile, serde_json::json!({ "compileError": "Compile error?" }));
    assert_eq!(failure["error"], "Message 'foo' not understood.");
    assert_eq!(failure["backtrace"]["skippedFrames"], 1);
}
