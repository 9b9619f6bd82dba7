//! Startup files evaluated once the session is initialised.

use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

use camino::{Utf8Path, Utf8PathBuf};
use quarkls_config::StartupSettings;
use quarkls_eval::{EvaluationOutcome, Evaluator};
use tracing::{debug, info, warn};

use super::SESSION_TARGET;
use super::initialize::InitializationOptions;
use crate::scheduler::Scheduler;

/// Startup files the client opted into: the global file first, then one per
/// workspace root.
pub(crate) fn startup_files(
    settings: &StartupSettings,
    options: &InitializationOptions,
    roots: &[Utf8PathBuf],
) -> Vec<Utf8PathBuf> {
    let mut files = Vec::new();
    if options.use_global_startup_file() {
        match settings.global_startup_file() {
            Some(path) => files.push(path.to_path_buf()),
            None => debug!(target: SESSION_TARGET, "no global startup file configured"),
        }
    }
    if options.use_workspace_startup_file() {
        files.extend(
            roots
                .iter()
                .map(|root| settings.workspace_startup_file(root)),
        );
    }
    files
}

/// Queues one evaluation per file on `scheduler`.
pub(crate) fn schedule(
    scheduler: &Scheduler,
    evaluator: &Rc<RefCell<dyn Evaluator>>,
    files: Vec<Utf8PathBuf>,
) {
    for path in files {
        let evaluator = Rc::clone(evaluator);
        scheduler.schedule(move || run_startup_file(&evaluator, &path));
    }
}

fn run_startup_file(evaluator: &RefCell<dyn Evaluator>, path: &Utf8Path) {
    if !path.is_file() {
        debug!(target: SESSION_TARGET, %path, "startup file missing; skipped");
        return;
    }
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) => {
            warn!(target: SESSION_TARGET, %path, %error, "failed to read startup file");
            return;
        }
    };

    match evaluator.borrow_mut().evaluate_in(Some(path), &source) {
        EvaluationOutcome::Success { .. } => {
            info!(target: SESSION_TARGET, %path, "startup file evaluated");
        }
        EvaluationOutcome::CompileError { message }
        | EvaluationOutcome::EvaluationError { message, .. } => {
            warn!(target: SESSION_TARGET, %path, error = %message, "startup file failed");
        }
    }
}
