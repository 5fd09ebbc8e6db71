use clap::{Parser, Subcommand};
use inquire::Password;
use wxdash_core::Config;

use crate::session::{Session, prompt};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxdash", version, about = "Weather watch-list dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure,

    /// Add a city to the watch-list by name.
    Add {
        /// City name, e.g. "Paris" or "London,GB".
        city: String,
    },

    /// Search for a city and add the one you pick.
    Search {
        /// Start with this query instead of typing interactively.
        query: Option<String>,
    },

    /// Print the watch-list.
    List {
        /// Show temperatures in Fahrenheit.
        #[arg(long)]
        fahrenheit: bool,

        /// Include the hourly forecast panel.
        #[arg(long)]
        forecast: bool,
    },

    /// Re-fetch one city, or every city when none is given.
    Refresh { city: Option<String> },

    /// Remove every entry with this name.
    Remove { city: String },

    /// Interactive dashboard (the default).
    Dashboard,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        let open = || Session::open(&config);

        match self.command.unwrap_or(Command::Dashboard) {
            Command::Configure => return configure(config.clone()).await,
            Command::Add { city } => {
                let mut session = open()?;
                if session.add_by_name(&city).await {
                    session.print(false);
                }
            }
            Command::Search { query } => {
                let mut session = open()?;
                if session.search_and_add(query).await? {
                    session.print(false);
                }
            }
            Command::List { fahrenheit, forecast } => {
                let mut session = open()?;
                if fahrenheit {
                    session.toggle_unit();
                }
                session.print(forecast);
            }
            Command::Refresh { city } => {
                let mut session = open()?;
                match city {
                    Some(city) => {
                        session.refresh(&city).await;
                    }
                    None => session.refresh_all().await,
                }
                session.print(false);
            }
            Command::Remove { city } => {
                let mut session = open()?;
                session.remove(&city);
                session.print(false);
            }
            Command::Dashboard => open()?.interactive().await?,
        }

        Ok(())
    }
}

async fn configure(mut config: Config) -> anyhow::Result<()> {
    let key = prompt(|| {
        Password::new("OpenWeather API key:")
            .without_confirmation()
            .with_help_message("Get one at https://home.openweathermap.org/api_keys")
            .prompt()
    })
    .await?;

    let Some(key) = key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) else {
        println!("No key entered; configuration unchanged.");
        return Ok(());
    };

    config.set_api_key(key);
    config.save()?;
    println!("Saved to {}", Config::config_file_path()?.display());
    Ok(())
}
