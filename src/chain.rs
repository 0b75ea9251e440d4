//! Wires a source and `P - 1` merge stages into one running pipeline.

use crate::channel::{CancelToken, link};
use crate::config::PipelineConfig;
use crate::error::SortError;
use crate::metrics::{RunReport, StageReport};
use crate::order::MergeOrder;
use crate::source::Source;
use crate::stage::Stage;
use std::any::Any;
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;
use tracing::{debug, error, info};

#[derive(Debug)]
pub struct SortOutcome<T> {
    pub sorted: Vec<T>,
    pub report: RunReport,
}

enum Finished<T> {
    Source,
    Stage(StageReport, Option<Vec<T>>),
}

/// Sorts `items` with the configured order.
pub fn sort<T>(config: &PipelineConfig, items: Vec<T>) -> Result<SortOutcome<T>, SortError>
where
    T: Ord + Send,
{
    sort_by(config, items, config.order)
}

/// Sorts `items` with a caller-supplied merge order.
///
/// The input length must be exactly `2^(config.stages - 1)`; anything else is
/// rejected before a single thread starts.
pub fn sort_by<T, O>(config: &PipelineConfig, items: Vec<T>, order: O) -> Result<SortOutcome<T>, SortError>
where
    T: Send,
    O: MergeOrder<T> + Clone + Send,
{
    config.check_input_len(items.len())?;
    let total = items.len();
    let merge_stages = config.merge_stages();
    info!(stages = config.stages, total, channel = ?config.channel, "starting pipeline");

    let cancel = CancelToken::new();
    let mut outbounds = Vec::with_capacity(merge_stages);
    let mut inbounds = Vec::with_capacity(merge_stages);
    for _ in 0..merge_stages {
        let (tx, rx) = link(config.channel, &cancel);
        outbounds.push(tx);
        inbounds.push(rx);
    }
    // The first link feeds stage 1; link i joins stage i to stage i + 1.
    let mut outbounds = outbounds.into_iter();
    let Some(mut source_out) = outbounds.next() else {
        return Err(SortError::Setup("pipeline has no merge stages".to_string()));
    };

    let started = Instant::now();
    let (finished, failures) = thread::scope(|scope| {
        let cancel = &cancel;
        let mut handles: Vec<(String, ScopedJoinHandle<'_, Result<Finished<T>, SortError>>)> = Vec::new();
        let mut failures = Vec::new();

        let spawned = thread::Builder::new().name("source".to_string()).spawn_scoped(scope, move || {
            supervised(cancel, "source", || Source::new(items).run(&mut source_out).map(|_| Finished::Source))
        });
        match spawned {
            Ok(handle) => handles.push(("source".to_string(), handle)),
            Err(e) => {
                cancel.cancel();
                failures.push(("source".to_string(), SortError::Io(e)));
            }
        }

        for (offset, mut inbound) in inbounds.into_iter().enumerate() {
            let index = offset + 1;
            let name = format!("stage-{}", index);
            let outbound = outbounds.next();
            let order = order.clone();
            let member = name.clone();
            let spawned = thread::Builder::new().name(name.clone()).spawn_scoped(scope, move || {
                supervised(cancel, &member, || {
                    let mut stage = Stage::new(index, total, order)?;
                    match outbound {
                        Some(mut outbound) => stage
                            .run(&mut inbound, &mut outbound)
                            .map(|report| Finished::Stage(report, None)),
                        None => {
                            let mut sink = Vec::with_capacity(total);
                            let report = stage.run(&mut inbound, &mut sink)?;
                            Ok(Finished::Stage(report, Some(sink)))
                        }
                    }
                })
            });
            match spawned {
                Ok(handle) => handles.push((name, handle)),
                Err(e) => {
                    cancel.cancel();
                    failures.push((name, SortError::Io(e)));
                }
            }
        }

        let mut finished = Vec::new();
        for (name, handle) in handles {
            match handle.join() {
                Ok(Ok(done)) => finished.push(done),
                Ok(Err(e)) => failures.push((name, e)),
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    failures.push((name.clone(), SortError::Other(format!("{} panicked: {}", name, message))));
                }
            }
        }
        (finished, failures)
    });

    if !failures.is_empty() {
        return Err(aggregate(failures));
    }

    let mut sorted = None;
    let mut reports = Vec::with_capacity(merge_stages);
    for done in finished {
        if let Finished::Stage(report, sink) = done {
            reports.push(report);
            if sink.is_some() {
                sorted = sink;
            }
        }
    }
    let sorted = sorted.ok_or_else(|| SortError::Other("terminal stage produced no output".to_string()))?;
    let report = RunReport::new(total, config.stages, config.channel, started.elapsed().as_secs_f64(), reports);
    info!(wall_secs = report.wall_secs, "pipeline finished");
    Ok(SortOutcome { sorted, report })
}

/// Runs one chain member, cancelling the whole chain if it fails or panics.
fn supervised<R>(
    cancel: &CancelToken,
    name: &str,
    work: impl FnOnce() -> Result<R, SortError>,
) -> Result<R, SortError> {
    let _guard = CancelOnPanic { cancel, name };
    let result = work();
    if let Err(e) = &result {
        if cancel.cancel() {
            error!(member = name, error = %e, "cancelling pipeline");
        } else {
            debug!(member = name, error = %e, "stopped after cancellation");
        }
    }
    result
}

struct CancelOnPanic<'a> {
    cancel: &'a CancelToken,
    name: &'a str,
}

impl Drop for CancelOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            error!(member = self.name, "panicked, cancelling pipeline");
            self.cancel.cancel();
        }
    }
}

/// The first failure that is not just fallout from another one is the cause.
fn aggregate(mut failures: Vec<(String, SortError)>) -> SortError {
    let root = failures.iter().position(|(_, e)| !e.is_cascade()).unwrap_or(0);
    let (name, cause) = failures.swap_remove(root);
    error!(member = %name, cause = %cause, cancelled = failures.len(), "pipeline aborted");
    SortError::Aborted { cause: Box::new(cause), cancelled: failures.len() }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}
