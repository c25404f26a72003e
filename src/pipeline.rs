use crate::clock::{Clock, SystemClock};
use crate::collector::{EventCollector, RESERVED_PREFIX};
use crate::config::Config;
use crate::error::Error;
use crate::loggable::Loggable;
use crate::scheduler::{BufferScheduler, FlushTimer, ThreadTimer};
use crate::transport::{Dispatcher, Transport};
use std::iter;
use std::sync::Arc;

/// A complete telemetry pipeline: collector, scheduler and transport wired
/// together from one [`Config`].
///
/// Cloning is cheap and every clone feeds the same buffer. Independent
/// pipelines share nothing.
///
/// # Examples
///
/// ```
/// # use cloudpelican::{Config, ManualTimer, Pipeline, NullDispatcher};
/// # use cloudpelican::clock::SystemClock;
/// # use std::sync::Arc;
/// # use std::time::Duration;
/// let timer = Arc::new(ManualTimer::new());
/// let pipeline = Pipeline::with_runtime(
///     Config::new("my-token"),
///     Arc::new(NullDispatcher),
///     timer.clone(),
///     Arc::new(SystemClock),
/// ).unwrap();
///
/// assert!(pipeline.log("user clicked", false, [("button", "save")]));
/// assert_eq!(pipeline.buffered_events(), 1);
///
/// timer.advance(Duration::from_millis(200));
/// assert_eq!(pipeline.sequence(), 1);
/// assert_eq!(pipeline.buffered_events(), 0);
/// ```
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<Config>,
    collector: Arc<EventCollector>,
}

impl Pipeline {
    /// Builds a pipeline that flushes from a background timer thread and
    /// stamps events with wall-clock time.
    pub fn new(config: Config, dispatcher: Arc<dyn Dispatcher>) -> Result<Self, Error> {
        Self::with_runtime(config, dispatcher, Arc::new(ThreadTimer), Arc::new(SystemClock))
    }

    /// Builds a pipeline shipping to the configured endpoint over HTTP.
    #[cfg(feature = "http")]
    pub fn init(config: Config) -> Result<Self, Error> {
        let dispatcher = crate::dispatch::HttpDispatcher::new()?;
        Self::new(config, Arc::new(dispatcher))
    }

    /// Builds a pipeline with an explicit timer and clock.
    ///
    /// Fails when the configuration cannot be used; the reason is also
    /// reported through `tracing` under the reserved diagnostic prefix.
    pub fn with_runtime(
        config: Config,
        dispatcher: Arc<dyn Dispatcher>,
        timer: Arc<dyn FlushTimer>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, Error> {
        if let Err(err) = config.validate() {
            tracing::error!("{RESERVED_PREFIX} {err}");
            return Err(err);
        }

        let transport = Transport::new(&config, dispatcher);
        let scheduler = BufferScheduler::new(config.write_interval(), timer, transport);
        let collector = EventCollector::new(&config, clock, scheduler);
        tracing::debug!(
            endpoint = %config.endpoint,
            interval_ms = config.write_interval_ms,
            compression = config.compression,
            "pipeline initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            collector: Arc::new(collector),
        })
    }

    /// Captures a log call. See [`EventCollector::log`].
    pub fn log<M, I, K, V>(&self, message: M, is_error: bool, additional: I) -> bool
    where
        M: Loggable,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Loggable,
    {
        self.collector.log(message, is_error, additional)
    }

    /// Logs a plain message without additional fields.
    pub fn info<M: Loggable>(&self, message: M) -> bool {
        self.collector
            .log(message, false, iter::empty::<(String, String)>())
    }

    /// Logs an error message without additional fields.
    pub fn error<M: Loggable>(&self, message: M) -> bool {
        self.collector
            .log(message, true, iter::empty::<(String, String)>())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn host(&self) -> &str {
        self.collector.host()
    }

    /// Number of flushes so far.
    pub fn sequence(&self) -> u64 {
        self.collector.scheduler().sequence()
    }

    /// Events waiting for the next flush.
    pub fn buffered_events(&self) -> usize {
        self.collector.scheduler().buffered()
    }

    pub fn is_flush_pending(&self) -> bool {
        self.collector.scheduler().is_flush_pending()
    }
}
