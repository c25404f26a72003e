use crate::compressor;
use crate::config::Config;
use crate::event::Event;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt;
use std::sync::Arc;

/// Characters left untouched by `encodeURIComponent`; everything else is
/// percent-encoded so the collector sees the same bytes a browser would send.
const COMPONENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Prefix of the identifier given to every dispatched request.
pub const REQUEST_ID_PREFIX: &str = "cloudpelican_";

/// Endpoint flavour, chosen by batch size.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Mode {
    /// Exactly one event, unindexed field keys.
    Single,
    /// Two or more events, field keys qualified by event index.
    Bulk,
}

impl Mode {
    pub fn for_batch_len(len: usize) -> Self {
        if len == 1 {
            Mode::Single
        } else {
            Mode::Bulk
        }
    }

    pub fn sub_path(self) -> &'static str {
        match self {
            Mode::Single => "single",
            Mode::Bulk => "bulk",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sub_path())
    }
}

/// A fully serialized request, ready to be fired at the collector.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct WireRequest {
    /// Flush sequence number this request carries.
    pub sequence: u64,
    pub mode: Mode,
    /// Whether the fields travel as a single `c` parameter.
    pub compressed: bool,
    /// Complete GET target, endpoint included.
    pub target: String,
}

impl WireRequest {
    /// Bookkeeping identifier, e.g. `cloudpelican_3`.
    pub fn id(&self) -> String {
        format!("{REQUEST_ID_PREFIX}{}", self.sequence)
    }
}

/// One-way delivery of serialized requests.
///
/// Implementations must not block the caller on the network and must not
/// report failures back: whatever happens to the request after `dispatch`
/// returns is invisible to the pipeline.
///
/// # Usage
///
/// ```
/// # use cloudpelican::{Dispatcher, WireRequest};
/// # use std::sync::Mutex;
/// // Keeps every request in memory
/// struct Recorder(Mutex<Vec<WireRequest>>);
///
/// impl Dispatcher for Recorder {
///     fn dispatch(&self, request: WireRequest) {
///         self.0.lock().unwrap().push(request);
///     }
/// }
/// ```
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, request: WireRequest);
}

/// Turns flushed batches into wire requests and hands them to a
/// [`Dispatcher`].
pub struct Transport {
    base: String,
    token: String,
    compression: bool,
    dispatcher: Arc<dyn Dispatcher>,
}

impl Transport {
    pub fn new(config: &Config, dispatcher: Arc<dyn Dispatcher>) -> Self {
        let mut base = config.endpoint.trim_end_matches('/').to_owned();
        base.push('/');
        Self {
            base,
            token: config.token.clone(),
            compression: config.compression,
            dispatcher,
        }
    }

    /// Serializes `batch` and dispatches it. Nothing is observed of the
    /// outcome.
    pub fn send(&self, batch: Vec<Event>, sequence: u64) {
        if batch.is_empty() {
            return;
        }
        let request = self.build_request(&batch, sequence);
        tracing::debug!(
            id = %request.id(),
            events = batch.len(),
            mode = %request.mode,
            compressed = request.compressed,
            bytes = request.target.len(),
            "dispatching batch"
        );
        self.dispatcher.dispatch(request);
    }

    /// Builds the request for `batch` without dispatching it.
    pub fn build_request(&self, batch: &[Event], sequence: u64) -> WireRequest {
        let mode = Mode::for_batch_len(batch.len());
        let mut target = format!(
            "{}{}?js=1&t={}",
            self.base,
            mode.sub_path(),
            escape(&self.token)
        );

        let fields = serialize_fields(batch, mode);
        let mut compressed = false;
        if self.compression {
            let stream = compressor::encode(&fields);
            if stream.len() < fields.len() {
                target.push_str("&c=");
                target.push_str(&stream);
                compressed = true;
            }
        }
        if !compressed {
            target.push_str(&fields);
        }

        WireRequest {
            sequence,
            mode,
            compressed,
            target,
        }
    }
}

/// Renders the per-field query parameters of `batch` in FIFO order, fields
/// in insertion order.
pub fn serialize_fields(batch: &[Event], mode: Mode) -> String {
    let mut out = String::new();
    for (index, event) in batch.iter().enumerate() {
        for (key, value) in event.fields() {
            out.push_str("&f");
            if mode == Mode::Bulk {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
            out.push('[');
            out.push_str(&escape(key));
            out.push_str("]=");
            out.push_str(&escape(value));
        }
    }
    out
}

/// Percent-encodes `s` with `encodeURIComponent` rules.
pub fn escape(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT_SET).to_string()
}
