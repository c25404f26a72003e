//! # CloudPelican
//!
//! A fire-and-forget telemetry client that ships application log and error
//! events to a remote collector using as few bytes as possible and without
//! ever blocking the caller:
//!
//! * **Deduplication**: a message identical to the previous accepted one is dropped
//! * **Debounced batching**: every event logged within one write interval travels in one request
//! * **Compression**: the field payload is LZW-encoded whenever that makes it shorter
//! * **Best effort**: no retries, no acknowledgements, failures are invisible
//!
//! ## Main Components
//!
//! * `EventCollector`: validates log calls and turns them into `Event`s
//! * `BufferScheduler`: batches events and flushes once per debounce window
//! * `compressor`: per-call LZW encoder (and its collector-side decoder)
//! * `Transport`: serializes a batch into a GET target and hands it to a `Dispatcher`
//! * `hooks`: panic hook and `tracing` layer adapters feeding a `Pipeline`
//!
//! ## Quick Start
//!
//! ```
//! use cloudpelican::{Config, Dispatcher, ManualTimer, Pipeline, WireRequest};
//! use cloudpelican::clock::SystemClock;
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//!
//! // Keep requests in memory instead of sending them
//! #[derive(Default)]
//! struct Recorder(Mutex<Vec<WireRequest>>);
//! impl Dispatcher for Recorder {
//!     fn dispatch(&self, request: WireRequest) {
//!         self.0.lock().unwrap().push(request);
//!     }
//! }
//!
//! let recorder = Arc::new(Recorder::default());
//! let timer = Arc::new(ManualTimer::new());
//! let pipeline = Pipeline::with_runtime(
//!     Config::new("my-token").with_host("example.org"),
//!     recorder.clone(),
//!     timer.clone(),
//!     Arc::new(SystemClock),
//! ).unwrap();
//!
//! pipeline.info("Hello, world!");
//! pipeline.log("Payment failed", true, [("order", 42)]);
//!
//! // Both events leave together once the write interval has passed
//! timer.advance(Duration::from_millis(200));
//! let sent = recorder.0.lock().unwrap();
//! assert_eq!(sent.len(), 1);
//! assert!(sent[0].target.starts_with("https://api.cloudpelican.com/api/push/bulk?js=1&t=my-token"));
//! ```

pub mod clock;
pub mod collector;
pub mod compressor;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod hooks;
pub mod loggable;
pub mod pipeline;
pub mod reader;
pub mod scheduler;
pub mod transport;

pub use collector::{EventCollector, RESERVED_PREFIX};
pub use config::Config;
pub use dispatch::NullDispatcher;
#[cfg(feature = "http")]
pub use dispatch::HttpDispatcher;
pub use error::Error;
pub use event::Event;
pub use loggable::Loggable;
pub use pipeline::Pipeline;
pub use scheduler::{BufferScheduler, FlushTimer, ManualTimer, ThreadTimer};
pub use transport::{Dispatcher, Mode, Transport, WireRequest};
