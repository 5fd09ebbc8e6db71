//! Search-as-you-type city lookup.
//!
//! Each call to [`CitySearch::set_query`] restarts a quiet-period timer. Only
//! when the timer runs out does a geocoding request go out, so a burst of
//! keystrokes costs one request. Requests that are already in flight are left
//! alone, but their results are dropped if newer input has arrived meanwhile.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::{sync::Notify, task::JoinHandle};

use crate::{
    config::SearchConfig,
    model::{CitySuggestion, Selection},
    provider::WeatherApi,
};

/// Read-only view of the search box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSnapshot {
    pub query: String,
    pub suggestions: Vec<CitySuggestion>,
    pub loading: bool,
    pub panel_visible: bool,
}

#[derive(Debug, Default)]
struct SearchState {
    query: String,
    suggestions: Vec<CitySuggestion>,
    /// Bumped on every input change; lookups tagged with an older value are stale.
    generation: u64,
    /// Lookups sent and not yet answered, stale ones included.
    in_flight: usize,
    timer: Option<JoinHandle<()>>,
}

impl SearchState {
    fn timer_pending(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// A request is out and the box still holds a searchable query.
    fn loading(&self, min_query_len: usize) -> bool {
        self.in_flight > 0 && self.query.chars().count() >= min_query_len
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// Debounced geocoding search. Cheap to clone; clones share state.
///
/// Must be driven from inside a Tokio runtime.
#[derive(Debug, Clone)]
pub struct CitySearch {
    api: Arc<dyn WeatherApi>,
    settings: SearchConfig,
    state: Arc<Mutex<SearchState>>,
    changed: Arc<Notify>,
}

impl CitySearch {
    pub fn new(api: Arc<dyn WeatherApi>, settings: SearchConfig) -> Self {
        Self {
            api,
            settings,
            state: Arc::new(Mutex::new(SearchState::default())),
            changed: Arc::new(Notify::new()),
        }
    }

    /// Record new input text and schedule a lookup for it.
    pub fn set_query(&self, text: &str) {
        let mut state = self.state.lock();
        state.cancel_timer();
        state.generation += 1;
        state.query = text.to_string();

        if text.chars().count() < self.settings.min_query_len {
            state.suggestions.clear();
            drop(state);
            self.changed.notify_waiters();
            return;
        }

        let generation = state.generation;
        let api = Arc::clone(&self.api);
        let shared = Arc::clone(&self.state);
        let changed = Arc::clone(&self.changed);
        let debounce = self.settings.debounce();
        let limit = self.settings.limit;

        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            let query = {
                let mut state = shared.lock();
                if state.generation != generation {
                    return;
                }
                state.in_flight += 1;
                state.query.clone()
            };
            changed.notify_waiters();

            // Detached so that newer keystrokes, which abort this timer task,
            // never cancel a request that has already gone out.
            tokio::spawn(run_lookup(api, shared, changed, generation, query, limit));
        }));
    }

    /// The "x" button: empty the box.
    pub fn clear(&self) {
        self.set_query("");
    }

    /// Pick the suggestion at `index`, resetting the search box.
    ///
    /// Returns `None` and leaves everything as is when `index` is out of range.
    pub fn select(&self, index: usize) -> Option<Selection> {
        let mut state = self.state.lock();
        let chosen = Selection::from(state.suggestions.get(index)?);

        state.cancel_timer();
        state.generation += 1;
        state.query.clear();
        state.suggestions.clear();
        drop(state);
        self.changed.notify_waiters();

        tracing::info!("Selected {} ({}, {})", chosen.name, chosen.lat, chosen.lon);
        Some(chosen)
    }

    pub fn query(&self) -> String {
        self.state.lock().query.clone()
    }

    pub fn suggestions(&self) -> Vec<CitySuggestion> {
        self.state.lock().suggestions.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading(self.settings.min_query_len)
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        let state = self.state.lock();
        SearchSnapshot {
            query: state.query.clone(),
            suggestions: state.suggestions.clone(),
            loading: state.loading(self.settings.min_query_len),
            panel_visible: !state.suggestions.is_empty(),
        }
    }

    /// Wait until no timer is pending and every lookup sent so far has answered.
    pub async fn settle(&self) {
        loop {
            let notified = self.changed.notified();
            {
                let state = self.state.lock();
                if !state.timer_pending() && state.in_flight == 0 {
                    return;
                }
            }
            notified.await;
        }
    }
}

async fn run_lookup(
    api: Arc<dyn WeatherApi>,
    shared: Arc<Mutex<SearchState>>,
    changed: Arc<Notify>,
    generation: u64,
    query: String,
    limit: u8,
) {
    tracing::debug!("Looking up city suggestions for '{query}'");
    let result = api.geocode(&query, limit).await;

    {
        let mut state = shared.lock();
        state.in_flight = state.in_flight.saturating_sub(1);

        if state.generation != generation {
            tracing::debug!("Discarding stale suggestions for '{query}'");
        } else {
            match result {
                Ok(found) => state.suggestions = found,
                Err(e) => {
                    tracing::error!("Error fetching city suggestions: {e}");
                    state.suggestions.clear();
                }
            }
        }
    }

    changed.notify_waiters();
}
