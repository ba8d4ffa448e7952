//! Scripted [`GeocodeService`] for unit tests.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use qof_map_geocoder_models::Coordinate;
use tokio::time::Instant;

use crate::{GeocodeError, GeocodeService, Lookup};

/// One scripted reply.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Match(f64, f64),
    NoMatch,
    Fail,
}

/// Replies are consumed per address in order; an address with no replies
/// left (or none scripted) answers [`Reply::NoMatch`].
#[derive(Default)]
pub struct StubService {
    scripts: Mutex<BTreeMap<String, VecDeque<Reply>>>,
    calls: Mutex<BTreeMap<String, Vec<Instant>>>,
    latency: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl StubService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, address: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(address.to_string(), replies.into());
        self
    }

    /// Every request takes `latency` to answer.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self, address: &str) -> usize {
        self.calls.lock().unwrap().get(address).map_or(0, Vec::len)
    }

    pub fn call_times(&self, address: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .unwrap_or_default()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().map(Vec::len).sum()
    }

    /// Highest number of requests observed in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeocodeService for StubService {
    async fn lookup(&self, address: &str) -> Result<Lookup, GeocodeError> {
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_in_flight, Ordering::SeqCst);

        self.calls
            .lock()
            .unwrap()
            .entry(address.to_string())
            .or_default()
            .push(Instant::now());

        let reply = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(address)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Reply::NoMatch);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            Reply::Match(lat, lng) => Ok(Lookup::Match(Coordinate::new(lat, lng))),
            Reply::NoMatch => Ok(Lookup::NoMatch),
            Reply::Fail => Err(GeocodeError::Status {
                status: "UNKNOWN_ERROR".to_string(),
                message: Some("scripted failure".to_string()),
            }),
        }
    }
}
