#![allow(dead_code)]

use cloudpelican::clock::ManualClock;
use cloudpelican::reader::DecodedRequest;
use cloudpelican::{Config, Dispatcher, ManualTimer, Pipeline, WireRequest};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TOKEN: &str = "tok";
pub const HOST: &str = "example.org";
pub const START_MILLIS: u64 = 1_700_000_000_000;
pub const INTERVAL: Duration = Duration::from_millis(200);

/// Keeps every dispatched request.
#[derive(Default)]
pub struct CollectingDispatcher {
    pub requests: Mutex<Vec<WireRequest>>,
}

impl CollectingDispatcher {
    pub fn sent(&self) -> Vec<WireRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn decoded(&self) -> Vec<DecodedRequest> {
        self.sent()
            .iter()
            .map(|r| DecodedRequest::parse(&r.target).unwrap())
            .collect()
    }
}

impl Dispatcher for CollectingDispatcher {
    fn dispatch(&self, request: WireRequest) {
        self.requests.lock().unwrap().push(request);
    }
}

pub struct Harness {
    pub pipeline: Pipeline,
    pub timer: Arc<ManualTimer>,
    pub clock: Arc<ManualClock>,
    pub dispatcher: Arc<CollectingDispatcher>,
}

impl Harness {
    pub fn advance_past_interval(&self) -> usize {
        self.timer.advance(INTERVAL)
    }
}

pub fn config() -> Config {
    Config::new(TOKEN).with_host(HOST)
}

pub fn harness(config: Config) -> Harness {
    let timer = Arc::new(ManualTimer::new());
    let clock = Arc::new(ManualClock::new(START_MILLIS));
    let dispatcher = Arc::new(CollectingDispatcher::default());
    let pipeline =
        Pipeline::with_runtime(config, dispatcher.clone(), timer.clone(), clock.clone()).unwrap();
    Harness {
        pipeline,
        timer,
        clock,
        dispatcher,
    }
}
