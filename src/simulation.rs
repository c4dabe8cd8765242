//! # Year Simulation Playback
//!
//! Compressed-time playback of a year of prayer schedules: 365 days played
//! forward at one day per 200ms, a 1-second pause, then rewound at one day
//! per 5ms back to today, after which the live display returns.
//!
//! ## State machine
//!
//! ```text
//! Idle --start()--> FetchingYear --ok--> PlayingForward --end--> PausedBetween
//!   ^                    |                                           |
//!   |                 total failure                              timeout
//!   |                    v                                           v
//!   +---- stop() from any non-Idle state ---- Stopped <---- PlayingReverse
//! ```
//!
//! `start()` on a non-idle controller is `stop()` — toggle semantics, never
//! a second concurrent run. One spawned task drives a whole playback pass,
//! so at most one forward and one reverse ticker can ever be live; spawning
//! a new pass aborts any predecessor first.
//!
//! ## Fetching
//!
//! On a yearly-cache miss the controller requests 365 days sequentially —
//! one request completes before the next begins, with a small delay in
//! between, to stay under the provider's rate limit. A failed day becomes
//! an absent record without aborting the batch; only a batch with zero
//! valid days is a failure. Cancellation is soft: stop requesting further
//! days and discard partial results.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, Local, NaiveDate};
use log::warn;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time;

use crate::cache::{KeyValueStore, PrayerCache};
use crate::display::{render_day, short_date, DisplaySink};
use crate::live;
use crate::provider::PrayerDataProvider;
use crate::{Coordinates, DateKey, DayRecord, YearDataset, DAYS_PER_YEAR};

/// Button label while no simulation is running.
pub const START_LABEL: &str = "Simulate Year of Prayer Times";

/// Button label while a simulation is running.
pub const STOP_LABEL: &str = "Stop Simulation";

/// Playback phases. `Stopped` is the transient phase between cancelling
/// the timers and handing the display back to the live clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationState {
    Idle,
    FetchingYear,
    PlayingForward,
    PausedBetween,
    PlayingReverse,
    Stopped,
}

/// Tick periods of the playback engine. Reverse runs ~40x faster than
/// forward; tests inject fast periods.
#[derive(Clone, Copy, Debug)]
pub struct PlaybackPeriods {
    pub forward: Duration,
    pub pause: Duration,
    pub reverse: Duration,
}

impl Default for PlaybackPeriods {
    fn default() -> Self {
        PlaybackPeriods {
            forward: Duration::from_millis(200),
            pause: Duration::from_millis(1000),
            reverse: Duration::from_millis(5),
        }
    }
}

/// Tunables the binary fills from its config.
#[derive(Clone, Copy, Debug)]
pub struct SimulationOptions {
    pub periods: PlaybackPeriods,
    /// Delay between sequential yearly-fetch requests.
    pub fetch_delay: Duration,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        SimulationOptions {
            periods: PlaybackPeriods::default(),
            fetch_delay: Duration::from_millis(60),
        }
    }
}

struct SimState {
    phase: SimulationState,
    day_index: i64,
    dataset: Option<Arc<YearDataset>>,
}

struct Inner<P, D, K: KeyValueStore> {
    provider: P,
    sink: D,
    cache: Arc<Mutex<PrayerCache<K>>>,
    state: Mutex<SimState>,
    runner: Mutex<Option<JoinHandle<()>>>,
    fetch_cancelled: AtomicBool,
    options: SimulationOptions,
    coords: Coordinates,
    location_label: String,
}

/// The playback controller. Cheap to clone; clones share one state
/// machine.
pub struct YearSimulation<P, D, K: KeyValueStore> {
    inner: Arc<Inner<P, D, K>>,
}

impl<P, D, K: KeyValueStore> Clone for YearSimulation<P, D, K> {
    fn clone(&self) -> Self {
        YearSimulation {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, D, K> YearSimulation<P, D, K>
where
    P: PrayerDataProvider + 'static,
    D: DisplaySink + 'static,
    K: KeyValueStore + Send + 'static,
{
    pub fn new(
        provider: P,
        sink: D,
        cache: Arc<Mutex<PrayerCache<K>>>,
        coords: Coordinates,
        location_label: impl Into<String>,
        options: SimulationOptions,
    ) -> Self {
        YearSimulation {
            inner: Arc::new(Inner {
                provider,
                sink,
                cache,
                state: Mutex::new(SimState {
                    phase: SimulationState::Idle,
                    day_index: 0,
                    dataset: None,
                }),
                runner: Mutex::new(None),
                fetch_cancelled: AtomicBool::new(false),
                options,
                coords,
                location_label: location_label.into(),
            }),
        }
    }

    pub async fn state(&self) -> SimulationState {
        self.inner.state.lock().await.phase
    }

    pub async fn is_active(&self) -> bool {
        self.state().await != SimulationState::Idle
    }

    /// Start a simulation run, or stop the running one (toggle semantics).
    ///
    /// Resolves the dataset — yearly cache first, then a sequential
    /// 365-day fetch — and hands it to the playback task. On total fetch
    /// failure reports an error and returns to `Idle` without ever
    /// entering `PlayingForward`.
    pub async fn start(&self) {
        {
            let mut state = self.inner.state.lock().await;
            if state.phase != SimulationState::Idle {
                drop(state);
                self.stop().await;
                return;
            }
            state.phase = SimulationState::FetchingYear;
        }
        self.inner.fetch_cancelled.store(false, Ordering::SeqCst);
        self.inner.sink.set_button(STOP_LABEL, false);

        // Simulation start date: today at local midnight.
        let start_date = Local::now().date_naive();
        let start_key = DateKey(start_date);

        let cached = self.inner.cache.lock().await.load_yearly(start_key);
        let from_cache = cached.is_some();
        let dataset = if from_cache {
            self.inner
                .sink
                .set_status("Loaded yearly data from cache. Starting simulation...");
            cached
        } else {
            self.fetch_year(start_date).await
        };

        if self.inner.fetch_cancelled.load(Ordering::SeqCst) {
            // stop() ran during the fetch and already restored the live
            // display; partial results are discarded.
            return;
        }

        let dataset = match dataset {
            Some(ds) if ds.valid_days() > 0 => ds,
            _ => {
                self.inner
                    .sink
                    .set_status("Failed to fetch yearly prayer times. Please try again.");
                self.inner.sink.set_button(START_LABEL, true);
                self.inner.state.lock().await.phase = SimulationState::Idle;
                return;
            }
        };

        if !from_cache {
            self.inner.sink.set_status("Yearly prayer times fetched!");
            let saved = self.inner.cache.lock().await.save_yearly(&dataset, start_key);
            if let Err(e) = saved {
                // Non-fatal: play from memory.
                warn!("yearly cache write failed: {e}");
                self.inner
                    .sink
                    .set_status("Warning: could not save yearly data to cache.");
            }
        }

        {
            let mut state = self.inner.state.lock().await;
            if state.phase != SimulationState::FetchingYear {
                return;
            }
            state.phase = SimulationState::PlayingForward;
            state.day_index = 0;
            state.dataset = Some(Arc::new(dataset));
        }
        self.inner.sink.set_button(STOP_LABEL, true);

        let mut runner = self.inner.runner.lock().await;
        if let Some(previous) = runner.take() {
            previous.abort();
        }
        *runner = Some(tokio::spawn(run_playback(Arc::clone(&self.inner))));
    }

    /// Stop from any non-idle state: cancel timers, discard progress, and
    /// give the display back to the live clock.
    pub async fn stop(&self) {
        self.inner.fetch_cancelled.store(true, Ordering::SeqCst);
        if let Some(handle) = self.inner.runner.lock().await.take() {
            handle.abort();
        }
        {
            let mut state = self.inner.state.lock().await;
            if state.phase == SimulationState::Idle {
                return;
            }
            state.phase = SimulationState::Stopped;
            state.day_index = 0;
            state.dataset = None;
        }
        self.inner.sink.set_status("Simulation stopped.");
        self.inner.sink.set_button(START_LABEL, true);
        restore_live(&self.inner).await;
        self.inner.state.lock().await.phase = SimulationState::Idle;
    }

    /// Wait for the current playback pass to finish.
    pub async fn join(&self) {
        let handle = self.inner.runner.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Sequentially fetch 365 days from the provider, one calendar day at
    /// a time starting at `start_date`. Failed days are recorded as absent
    /// without aborting the batch.
    async fn fetch_year(&self, start_date: NaiveDate) -> Option<YearDataset> {
        self.inner.sink.set_status(
            "Fetching yearly prayer times (this may take a few minutes)... 0/365",
        );

        let mut days = Vec::with_capacity(DAYS_PER_YEAR);
        for i in 0..DAYS_PER_YEAR {
            if self.inner.fetch_cancelled.load(Ordering::SeqCst) {
                return None;
            }
            let date = start_date.checked_add_days(Days::new(i as u64))?;
            let timings = self
                .inner
                .provider
                .timings(self.inner.coords, &DateKey(date))
                .await;
            days.push(DayRecord { date, timings });
            self.inner.sink.set_status(&format!(
                "Fetching yearly prayer times... {}/{}",
                i + 1,
                DAYS_PER_YEAR
            ));
            if !self.inner.options.fetch_delay.is_zero() {
                // Keeps the sequential loop under the provider's rate limit.
                time::sleep(self.inner.options.fetch_delay).await;
            }
        }
        Some(YearDataset {
            start: start_date,
            days,
        })
    }
}

/// Re-fetch and show today's live prayer times after a simulation ends.
async fn restore_live<P, D, K>(inner: &Inner<P, D, K>)
where
    P: PrayerDataProvider,
    D: DisplaySink,
    K: KeyValueStore,
{
    live::show_today(
        &inner.provider,
        &inner.cache,
        &inner.sink,
        inner.coords,
        &inner.location_label,
        false,
    )
    .await;
}

/// One full playback pass: forward, pause, reverse, restore.
async fn run_playback<P, D, K>(inner: Arc<Inner<P, D, K>>)
where
    P: PrayerDataProvider + 'static,
    D: DisplaySink + 'static,
    K: KeyValueStore + Send + 'static,
{
    let dataset = match inner.state.lock().await.dataset.clone() {
        Some(ds) => ds,
        None => return,
    };
    let len = dataset.days.len() as i64;

    let mut ticker = time::interval(inner.options.periods.forward);
    loop {
        ticker.tick().await;
        let mut state = inner.state.lock().await;
        if state.phase != SimulationState::PlayingForward {
            return;
        }
        if state.day_index >= len {
            state.phase = SimulationState::PausedBetween;
            break;
        }
        let index = state.day_index;
        state.day_index += 1;
        drop(state);

        let record = &dataset.days[index as usize];
        inner.sink.set_status(&format!(
            "Simulating: Day {}/{} ({})",
            index + 1,
            len,
            short_date(record.date)
        ));
        render_day(&inner.sink, record);
    }
    inner
        .sink
        .set_status("Forward simulation complete. Pausing...");

    time::sleep(inner.options.periods.pause).await;

    {
        let mut state = inner.state.lock().await;
        if state.phase != SimulationState::PausedBetween {
            return;
        }
        state.phase = SimulationState::PlayingReverse;
        state.day_index = len - 1;
    }
    inner.sink.set_status("Starting rewind...");

    let mut ticker = time::interval(inner.options.periods.reverse);
    loop {
        ticker.tick().await;
        let mut state = inner.state.lock().await;
        if state.phase != SimulationState::PlayingReverse {
            return;
        }
        if state.day_index < 0 {
            state.phase = SimulationState::Idle;
            state.dataset = None;
            break;
        }
        let index = state.day_index;
        state.day_index -= 1;
        drop(state);

        let record = &dataset.days[index as usize];
        inner.sink.set_status(&format!(
            "Rewinding: Day {}/{} ({})",
            index + 1,
            len,
            short_date(record.date)
        ));
        render_day(&inner.sink, record);
    }

    inner.sink.set_status("Yearly simulation rewind complete!");
    inner.sink.set_button(START_LABEL, true);
    restore_live(&inner).await;
}
