//! Periodic availability polling with edge detection
//!
//! A [`Poller`] asks its [`StatusApi`] for the doorbell's availability on
//! every tick. When availability flips it updates an [`IndicatorSink`], and
//! on every false→true flip it also fetches the door listing.
//!
//! Requests run as separate tasks so a hung request never delays the next
//! tick. Their results are applied by the poll loop alone, in the order they
//! complete.

use crate::{
    status_api::StatusApi,
    types::{DoorList, Indicator, PollResult},
};
use anyhow::{Context, Result};
use log::{debug, info};
use std::{sync::Arc, time::Duration};
use tokio::{
    task::{JoinError, JoinSet},
    time::{Instant, MissedTickBehavior, interval_at},
};

/// Where connectivity changes are shown
pub trait IndicatorSink {
    fn show(&mut self, indicator: Indicator);
}

/// Sink writing indicator changes to the log
#[derive(Debug, Default)]
pub struct LogIndicator {
    current: Option<Indicator>,
}

impl LogIndicator {
    pub fn current(&self) -> Option<Indicator> {
        self.current
    }
}

impl IndicatorSink for LogIndicator {
    fn show(&mut self, indicator: Indicator) {
        info!("doorbell {indicator}: background {}", indicator.color());
        self.current = Some(indicator);
    }
}

/// Connectivity as seen by the last two successful polls
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ConnectivityState {
    connected: bool,
    prev_connected: bool,
}

/// Edge detected by a single poll
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Transition {
    Connected,
    Disconnected,
    Unchanged,
}

impl ConnectivityState {
    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn prev_connected(&self) -> bool {
        self.prev_connected
    }

    /// Record a polled availability and report the edge it caused
    pub fn update(&mut self, available: bool) -> Transition {
        self.connected = available;

        let transition = match (self.connected, self.prev_connected) {
            (true, false) => Transition::Connected,
            (false, true) => Transition::Disconnected,
            _ => Transition::Unchanged,
        };

        self.prev_connected = self.connected;
        transition
    }
}

pub struct Poller<Api, Sink> {
    api: Arc<Api>,
    sink: Sink,
    state: ConnectivityState,
    interval: Duration,
}

impl<Api, Sink> Poller<Api, Sink>
where
    Api: StatusApi + Send + Sync + 'static,
    Sink: IndicatorSink,
{
    pub fn new(api: Api, sink: Sink, interval: Duration) -> Self {
        Self {
            api: Arc::new(api),
            sink,
            state: ConnectivityState::default(),
            interval,
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    /// Poll forever, one tick per interval
    ///
    /// The first tick fires one interval after the call. Missed ticks are
    /// not caught up. Dropping the future stops polling and aborts requests
    /// still in flight.
    pub async fn start(&mut self) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut polls: JoinSet<Result<PollResult>> = JoinSet::new();
        let mut listings: JoinSet<Result<DoorList>> = JoinSet::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let api = Arc::clone(&self.api);
                    polls.spawn(async move { api.poll().await });
                }
                Some(joined) = polls.join_next() => {
                    if self.on_poll(flatten(joined)) == Some(Transition::Connected) {
                        self.list_doors(&mut listings);
                    }
                }
                Some(joined) = listings.join_next() => {
                    on_doors(flatten(joined));
                }
            }
        }
    }

    /// Apply one poll outcome; failed polls leave the state untouched
    fn on_poll(&mut self, result: Result<PollResult>) -> Option<Transition> {
        let poll = match result {
            Ok(poll) => poll,
            Err(e) => {
                debug!("poll failed: {e:#}");
                return None;
            }
        };

        let transition = self.state.update(poll.available);
        match transition {
            Transition::Connected => self.sink.show(Indicator::Connected),
            Transition::Disconnected => self.sink.show(Indicator::Disconnected),
            Transition::Unchanged => {}
        }

        Some(transition)
    }

    fn list_doors(&self, listings: &mut JoinSet<Result<DoorList>>) {
        info!("listing doors");

        let api = Arc::clone(&self.api);
        listings.spawn(async move { api.list_doors().await });
    }
}

fn on_doors(result: Result<DoorList>) {
    match result {
        Ok(doors) => debug!("doors: {}", doors.0),
        Err(e) => debug!("listing doors failed: {e:#}"),
    }
}

fn flatten<T>(joined: Result<Result<T>, JoinError>) -> Result<T> {
    joined.context("request task failed")?
}
