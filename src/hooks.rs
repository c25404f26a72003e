//! Listener installation: feeding the host's own error and logging channels
//! into a [`Pipeline`].
//!
//! Each adapter runs the pipeline first and then hands the call on to
//! whatever was there before, so installing one never silences existing
//! handlers.

use crate::pipeline::Pipeline;
use std::fmt;
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Target prefix of this crate's own tracing events.
const OWN_TARGET: &str = "cloudpelican";

static PANIC_HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Ships every panic message to `pipeline` as an error event, then runs the
/// previously installed panic hook.
///
/// The panic hook is process-wide, so this installs at most once per
/// process: later calls leave the existing chain alone and return `false`.
pub fn install_panic_hook(pipeline: &Pipeline) -> bool {
    if PANIC_HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
        return false;
    }

    let previous = panic::take_hook();
    let pipeline = pipeline.clone();
    panic::set_hook(Box::new(move |info| {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic".to_owned());

        let mut fields = Vec::with_capacity(2);
        if let Some(location) = info.location() {
            fields.push(("file", location.file().to_owned()));
            fields.push(("line", location.line().to_string()));
        }
        pipeline.log(message, true, fields);

        previous(info);
    }));
    true
}

pub fn is_panic_hook_installed() -> bool {
    PANIC_HOOK_INSTALLED.load(Ordering::SeqCst)
}

/// A `tracing` layer forwarding events to a [`Pipeline`].
///
/// The event's `message` becomes the log message and its other fields become
/// additional fields. `ERROR` events are flagged as errors. Events emitted by
/// this crate itself are never forwarded.
///
/// ```
/// # use cloudpelican::{Config, Pipeline, NullDispatcher, hooks::TelemetryLayer};
/// # use std::sync::Arc;
/// use tracing_subscriber::prelude::*;
///
/// let pipeline = Pipeline::new(Config::new("token"), Arc::new(NullDispatcher)).unwrap();
/// let subscriber = tracing_subscriber::registry()
///     .with(TelemetryLayer::new(pipeline.clone()).with_min_level(tracing::Level::WARN));
///
/// tracing::subscriber::with_default(subscriber, || {
///     tracing::info!("not shipped");
///     tracing::warn!(disk = "sda1", "disk almost full");
/// });
/// assert_eq!(pipeline.buffered_events(), 1);
/// ```
pub struct TelemetryLayer {
    pipeline: Pipeline,
    min_level: Level,
}

impl TelemetryLayer {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            min_level: Level::TRACE,
        }
    }

    /// Only forward events at `level` or more severe.
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }
}

impl<S> Layer<S> for TelemetryLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_own_target(metadata.target()) || *metadata.level() > self.min_level {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        if let Some(message) = visitor.message {
            self.pipeline
                .log(message, *metadata.level() == Level::ERROR, visitor.fields);
        }
    }
}

fn is_own_target(target: &str) -> bool {
    target == OWN_TARGET
        || target
            .strip_prefix(OWN_TARGET)
            .is_some_and(|rest| rest.starts_with("::"))
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl FieldVisitor {
    fn put(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.push((field.name().to_owned(), value));
        }
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_owned());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, format!("{value:?}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_target_detection() {
        assert!(is_own_target("cloudpelican"));
        assert!(is_own_target("cloudpelican::scheduler"));
        assert!(!is_own_target("cloudpelican_app"));
        assert!(!is_own_target("my_app::cloudpelican"));
    }
}
