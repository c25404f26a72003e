//! Concrete [`Dispatcher`] implementations.

use crate::transport::{Dispatcher, WireRequest};

/// Drops every request. Handy when only the local side effects matter.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullDispatcher;

impl Dispatcher for NullDispatcher {
    fn dispatch(&self, _request: WireRequest) {}
}

#[cfg(feature = "http")]
pub use self::http::HttpDispatcher;

#[cfg(feature = "http")]
mod http {
    use super::*;
    use crate::error::Error;
    use reqwest::blocking::Client;
    use std::thread;
    use std::time::Duration;

    /// Fires each request as a plain GET from its own short-lived thread.
    ///
    /// The thread is named after the request id and exits as soon as the
    /// response arrives; the response body is never read. Failures are
    /// swallowed: there are no retries and nothing is reported to the
    /// pipeline. The client has no request timeout, so a stalled collector
    /// only holds its own dispatch thread.
    #[derive(Debug, Clone)]
    pub struct HttpDispatcher {
        client: Client,
    }

    impl HttpDispatcher {
        pub fn new() -> Result<Self, Error> {
            let client = Client::builder()
                .timeout(None::<Duration>)
                .build()
                .map_err(|err| Error::HttpClient(err.to_string()))?;
            Ok(Self { client })
        }
    }

    impl Dispatcher for HttpDispatcher {
        fn dispatch(&self, request: WireRequest) {
            let client = self.client.clone();
            let id = request.id();
            let spawned = thread::Builder::new().name(id.clone()).spawn(move || {
                if let Err(err) = client.get(&request.target).send() {
                    tracing::trace!(%id, %err, "delivery failed");
                }
            });
            if let Err(err) = spawned {
                tracing::trace!(%err, "could not start dispatch thread");
            }
        }
    }
}
