use crate::clock::Clock;
use crate::config::Config;
use crate::event::{Event, ERROR_FIELD, HOST_FIELD, MSG_FIELD, TIME_FIELD};
use crate::loggable::Loggable;
use crate::scheduler::BufferScheduler;
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Messages starting with this prefix are the client's own diagnostics and
/// are never shipped.
pub const RESERVED_PREFIX: &str = "CLOUDPELICAN:";

/// Host name used when neither the configuration nor the environment
/// provides one.
pub const FALLBACK_HOST: &str = "localhost";

/// Why a message was not accepted.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Rejection {
    Empty,
    TooLong,
    Reserved,
    Duplicate,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rejection::Empty => "empty message",
            Rejection::TooLong => "message exceeds maximum length",
            Rejection::Reserved => "reserved diagnostic prefix",
            Rejection::Duplicate => "duplicate of previous message",
        })
    }
}

/// Validates log calls, turns them into [`Event`]s and hands them to the
/// [`BufferScheduler`].
pub struct EventCollector {
    max_msg_length: usize,
    deduplication: bool,
    /// Text of the most recently accepted message.
    last_accepted: Mutex<Option<String>>,
    host_override: Option<String>,
    host: OnceLock<String>,
    clock: Arc<dyn Clock>,
    scheduler: BufferScheduler,
}

impl EventCollector {
    pub fn new(config: &Config, clock: Arc<dyn Clock>, scheduler: BufferScheduler) -> Self {
        Self {
            max_msg_length: config.max_msg_length,
            deduplication: config.deduplication,
            last_accepted: Mutex::new(None),
            host_override: config.host.clone(),
            host: OnceLock::new(),
            clock,
            scheduler,
        }
    }

    /// Captures one log call. Returns whether the event was accepted.
    ///
    /// `additional` fields are merged after the built-in ones and overwrite
    /// them on collision, `msg` included.
    pub fn log<M, I, K, V>(&self, message: M, is_error: bool, additional: I) -> bool
    where
        M: Loggable,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Loggable,
    {
        let message = message.to_field();
        let additional: Vec<(String, String)> = additional
            .into_iter()
            .map(|(key, value)| (key.into(), value.to_field()))
            .collect();

        // Held until the event is buffered, so flush order is acceptance order.
        let mut last = self.last_accepted.lock();
        if let Err(reason) = self.check(&message, last.as_deref()) {
            tracing::trace!(%reason, "message rejected");
            return false;
        }

        let mut event = Event::new();
        event.set(MSG_FIELD, message.clone());
        event.set(HOST_FIELD, self.host());
        event.set(TIME_FIELD, self.clock.now_millis().to_string());
        if is_error {
            event.set(ERROR_FIELD, "1");
        }
        for (key, value) in additional {
            event.set(key, value);
        }

        self.scheduler.enqueue(event);
        *last = Some(message);
        true
    }

    /// Runs the acceptance rules against `message`, given the text of the
    /// last accepted message.
    ///
    /// Length is counted in UTF-16 code units, the unit browsers report.
    fn check(&self, message: &str, last: Option<&str>) -> Result<(), Rejection> {
        if message.is_empty() {
            return Err(Rejection::Empty);
        }
        if message.encode_utf16().count() > self.max_msg_length {
            return Err(Rejection::TooLong);
        }
        if message.starts_with(RESERVED_PREFIX) {
            return Err(Rejection::Reserved);
        }
        if self.deduplication && last == Some(message) {
            return Err(Rejection::Duplicate);
        }
        Ok(())
    }

    /// The host stamped on every event, resolved on first use.
    pub fn host(&self) -> &str {
        self.host.get_or_init(|| match &self.host_override {
            Some(host) => host.clone(),
            None => resolve_host(),
        })
    }

    pub fn scheduler(&self) -> &BufferScheduler {
        &self.scheduler
    }
}

/// `HOSTNAME` is a shell variable that is often not exported to child
/// processes, so services that care about the host should set
/// [`Config::host`].
fn resolve_host() -> String {
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|host| !host.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_HOST.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::dispatch::NullDispatcher;
    use crate::scheduler::ManualTimer;
    use crate::transport::Transport;
    use std::time::Duration;

    fn collector(config: Config) -> EventCollector {
        let transport = Transport::new(&config, Arc::new(NullDispatcher));
        let scheduler = BufferScheduler::new(
            Duration::from_millis(200),
            Arc::new(ManualTimer::new()),
            transport,
        );
        EventCollector::new(&config, Arc::new(ManualClock::new(0)), scheduler)
    }

    fn log(c: &EventCollector, message: &str) -> bool {
        c.log(message, false, std::iter::empty::<(String, String)>())
    }

    #[test]
    fn rejection_reasons() {
        let c = collector(Config::new("t").with_max_msg_length(5));
        assert_eq!(c.check("", None), Err(Rejection::Empty));
        assert_eq!(c.check("toolong", None), Err(Rejection::TooLong));
        assert_eq!(c.check("CLOUDPELICAN:", None), Err(Rejection::TooLong));
        assert_eq!(c.check("ok", None), Ok(()));
        assert_eq!(c.check("ok", Some("ok")), Err(Rejection::Duplicate));
    }

    #[test]
    fn reserved_prefix_is_case_sensitive() {
        let c = collector(Config::new("t"));
        assert_eq!(c.check("CLOUDPELICAN: boom", None), Err(Rejection::Reserved));
        assert_eq!(c.check("cloudpelican: boom", None), Ok(()));
    }

    #[test]
    fn length_counts_utf16_units() {
        let c = collector(Config::new("t").with_max_msg_length(3));
        assert_eq!(c.check("\u{e9}\u{e9}\u{e9}", None), Ok(()));
        // Each emoji is a surrogate pair.
        assert_eq!(c.check("\u{1F600}\u{1F600}", None), Err(Rejection::TooLong));
        assert_eq!(c.check("\u{1F600}a", None), Ok(()));
    }

    #[test]
    fn rejected_message_leaves_dedup_slot_alone() {
        let c = collector(Config::new("t").with_max_msg_length(5));
        assert!(log(&c, "a"));
        assert!(!log(&c, "toolong"));
        assert!(!log(&c, "a"));
        assert_eq!(c.scheduler().buffered(), 1);
    }

    #[test]
    fn dedup_disabled_accepts_repeats() {
        let c = collector(Config::new("t").with_deduplication(false));
        assert!(log(&c, "a"));
        assert!(log(&c, "a"));
        assert_eq!(c.scheduler().buffered(), 2);
    }

    #[test]
    fn host_override_wins() {
        let c = collector(Config::new("t").with_host("example.org"));
        assert_eq!(c.host(), "example.org");
    }

    #[test]
    fn resolved_host_is_cached_and_non_empty() {
        let c = collector(Config::new("t"));
        let first = c.host().to_owned();
        assert!(!first.trim().is_empty());
        assert_eq!(c.host(), first);
    }
}
