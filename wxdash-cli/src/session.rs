//! Glue between the prompts and the core dashboard.
//!
//! Lookup failures are logged and otherwise ignored: the watch-list simply
//! stays as it was.

use std::{
    collections::HashSet,
    fmt,
    io::{self, Write},
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use inquire::{
    CustomUserError, InquireError, Select, Text,
    autocompletion::{Autocomplete, Replacement},
    error::InquireResult,
};
use wxdash_core::{
    CitySearch, CitySuggestion, Config, Dashboard, FileStore, Selection, TemperatureUnit,
    WeatherApi, provider::provider_from_config,
};

/// How often the search wait checks whether to show its notice.
const INDICATOR_TICK: Duration = Duration::from_millis(100);

/// Run a blocking prompt off the async workers. `None` means the user backed out.
pub async fn prompt<T, F>(f: F) -> anyhow::Result<Option<T>>
where
    T: Send + 'static,
    F: FnOnce() -> InquireResult<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await? {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Feeds keystrokes from the text prompt into the debounced search.
///
/// inquire only asks for suggestions when the input changes, so results that
/// land later show up on the next keystroke.
#[derive(Clone)]
struct SuggestionFeed {
    search: CitySearch,
}

impl Autocomplete for SuggestionFeed {
    fn get_suggestions(&mut self, input: &str) -> Result<Vec<String>, CustomUserError> {
        if input != self.search.query() {
            self.search.set_query(input);
        }
        Ok(self
            .search
            .suggestions()
            .iter()
            .map(CitySuggestion::label)
            .collect())
    }

    fn get_completion(
        &mut self,
        _input: &str,
        highlighted_suggestion: Option<String>,
    ) -> Result<Replacement, CustomUserError> {
        Ok(highlighted_suggestion)
    }
}

/// Wait for the search to go quiet, printing a notice once if a lookup is out.
async fn wait_for_suggestions(search: &CitySearch, out: &mut impl Write) -> io::Result<()> {
    let settled = search.settle();
    tokio::pin!(settled);

    let mut shown = false;
    loop {
        tokio::select! {
            () = &mut settled => return Ok(()),
            () = tokio::time::sleep(INDICATOR_TICK) => {
                if !shown && search.is_loading() {
                    writeln!(out, "Searching cities...")?;
                    out.flush()?;
                    shown = true;
                }
            }
        }
    }
}

/// Index of the suggestion whose label is exactly `text`, as left by a
/// tab-completed prompt.
fn suggestion_index(suggestions: &[CitySuggestion], text: &str) -> Option<usize> {
    suggestions.iter().position(|s| s.label() == text)
}

#[derive(Debug, Clone)]
enum Action {
    Search,
    AddByName,
    Refresh,
    RefreshAll,
    Remove,
    ToggleUnit(TemperatureUnit),
    ToggleForecast,
    Quit,
}

impl Action {
    fn menu(unit: TemperatureUnit, has_cities: bool) -> Vec<Action> {
        let mut items = vec![Action::Search, Action::AddByName];
        if has_cities {
            items.extend([
                Action::Refresh,
                Action::RefreshAll,
                Action::Remove,
                Action::ToggleForecast,
            ]);
        }
        items.extend([Action::ToggleUnit(unit), Action::Quit]);
        items
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Search => f.write_str("Search for a city"),
            Action::AddByName => f.write_str("Add a city by name"),
            Action::Refresh => f.write_str("Refresh a city"),
            Action::RefreshAll => f.write_str("Refresh all cities"),
            Action::Remove => f.write_str("Remove a city"),
            Action::ToggleUnit(unit) => write!(f, "Toggle unit (now {unit})"),
            Action::ToggleForecast => f.write_str("Show/hide hourly forecast"),
            Action::Quit => f.write_str("Quit"),
        }
    }
}

pub struct Session {
    dash: Dashboard<FileStore>,
    search: CitySearch,
    expanded: HashSet<String>,
}

impl Session {
    pub fn open(config: &Config) -> anyhow::Result<Self> {
        let api: Arc<dyn WeatherApi> = Arc::new(provider_from_config(config)?);
        let store = FileStore::new(config.data_dir()?);
        tracing::debug!("Watch-list stored under {}", store.dir().display());

        let dash =
            Dashboard::load(Arc::clone(&api), store).context("Failed to load the watch-list")?;

        Ok(Self {
            dash,
            search: CitySearch::new(api, config.search.clone()),
            expanded: HashSet::new(),
        })
    }

    pub async fn add_by_name(&mut self, name: &str) -> bool {
        println!("Fetching weather for {name}...");
        match self.dash.add_city(name).await {
            Ok(city) => {
                println!("Added {}", city.name);
                true
            }
            Err(e) => {
                tracing::error!("Error fetching city data: {e}");
                false
            }
        }
    }

    /// Search (interactively unless `query` is given), let the user pick, add the pick.
    pub async fn search_and_add(&mut self, query: Option<String>) -> anyhow::Result<bool> {
        let text = match query {
            Some(q) => q,
            None => {
                let feed = SuggestionFeed {
                    search: self.search.clone(),
                };
                let typed = prompt(move || {
                    Text::new("Search for a city:")
                        .with_autocomplete(feed)
                        .prompt()
                })
                .await?;
                match typed {
                    Some(t) => t,
                    None => {
                        self.search.clear();
                        return Ok(false);
                    }
                }
            }
        };

        let chosen = match suggestion_index(&self.search.suggestions(), &text) {
            Some(index) => self.search.select(index),
            None => self.pick_suggestion(&text).await?,
        };
        let Some(selection) = chosen else {
            self.search.clear();
            return Ok(false);
        };

        println!("Fetching weather for {}...", selection.name);
        match self.dash.add_selection(&selection).await {
            Ok(city) => {
                println!("Added {}", city.name);
                Ok(true)
            }
            Err(e) => {
                tracing::error!("Error fetching city data: {e}");
                Ok(false)
            }
        }
    }

    /// Look `text` up (unless it already was) and let the user pick a match.
    async fn pick_suggestion(&self, text: &str) -> anyhow::Result<Option<Selection>> {
        if text != self.search.query() {
            self.search.set_query(text);
        }
        wait_for_suggestions(&self.search, &mut io::stdout()).await?;

        let labels: Vec<String> = self
            .search
            .suggestions()
            .iter()
            .map(CitySuggestion::label)
            .collect();
        if labels.is_empty() {
            println!("No matching cities for '{}'.", text.trim());
            return Ok(None);
        }

        let picked = prompt(move || Select::new("Pick a city:", labels).raw_prompt()).await?;
        Ok(picked.and_then(|p| self.search.select(p.index)))
    }

    pub async fn refresh(&mut self, name: &str) -> bool {
        match self.dash.refresh_city(name).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Error refreshing city data: {e}");
                false
            }
        }
    }

    pub async fn refresh_all(&mut self) {
        let failed = self.dash.refresh_all().await;
        if !failed.is_empty() {
            tracing::warn!("Could not refresh: {}", failed.join(", "));
        }
    }

    pub fn remove(&mut self, name: &str) {
        match self.dash.remove_city(name) {
            Ok(0) => tracing::warn!("{name} is not on the watch-list"),
            Ok(_) => {
                self.expanded.remove(name);
            }
            Err(e) => tracing::error!("Error removing {name}: {e}"),
        }
    }

    pub fn toggle_unit(&mut self) -> TemperatureUnit {
        self.dash.toggle_unit()
    }

    /// Print every card; `expand_all` opens every forecast panel.
    pub fn print(&self, expand_all: bool) {
        if self.dash.is_empty() {
            println!("No cities added yet.");
            println!("Search for a city to begin tracking weather conditions.");
            return;
        }

        for card in self
            .dash
            .cards(|c| expand_all || self.expanded.contains(&c.name))
        {
            println!("{card}");
        }
    }

    async fn pick_city(&self, message: &'static str) -> anyhow::Result<Option<String>> {
        let mut seen = HashSet::new();
        let names: Vec<String> = self
            .dash
            .cities()
            .iter()
            .filter(|c| seen.insert(c.name.as_str()))
            .map(|c| c.name.clone())
            .collect();

        prompt(move || Select::new(message, names).prompt()).await
    }

    /// The dashboard loop: show cards, ask what to do, repeat.
    pub async fn interactive(&mut self) -> anyhow::Result<()> {
        loop {
            self.print(false);

            let menu = Action::menu(self.dash.unit(), !self.dash.is_empty());
            let Some(action) = prompt(move || Select::new("What next?", menu).prompt()).await?
            else {
                break;
            };

            match action {
                Action::Search => {
                    self.search_and_add(None).await?;
                }
                Action::AddByName => {
                    if let Some(name) = prompt(|| Text::new("City name:").prompt()).await? {
                        self.add_by_name(name.trim()).await;
                    }
                }
                Action::Refresh => {
                    if let Some(name) = self.pick_city("Refresh which city?").await? {
                        self.refresh(&name).await;
                    }
                }
                Action::RefreshAll => self.refresh_all().await,
                Action::Remove => {
                    if let Some(name) = self.pick_city("Remove which city?").await? {
                        self.remove(&name);
                    }
                }
                Action::ToggleUnit(_) => {
                    let unit = self.toggle_unit();
                    println!("Showing temperatures in {unit}");
                }
                Action::ToggleForecast => {
                    if let Some(name) = self.pick_city("Forecast for which city?").await? {
                        if !self.expanded.remove(&name) {
                            self.expanded.insert(name);
                        }
                    }
                }
                Action::Quit => break,
            }
        }

        Ok(())
    }
}
