use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select};
use owm_history_core::{
    Config, Coordinates, DataUnit, HistoricalClient, HistoricalParameters, HistoricalWeatherData,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "owm-history", version, about = "OpenWeatherMap historical weather CLI")]
pub struct Cli {
    /// Unit system: C, F or K. Overrides the configured unit.
    #[arg(long, global = true)]
    pub unit: Option<DataUnit>,

    /// Print the decoded response as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key and default unit.
    Configure,

    /// History for a location name, e.g. "Vancouver".
    ByName {
        location: String,
    },

    /// History for an OpenWeatherMap city ID.
    ById {
        id: u64,

        #[command(flatten)]
        window: Window,
    },

    /// History for a latitude/longitude pair.
    ByCoord {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        #[command(flatten)]
        window: Window,
    },
}

#[derive(Debug, Args)]
pub struct Window {
    /// Start of the window, Unix seconds (UTC).
    #[arg(long)]
    pub start: i64,

    /// End of the window, Unix seconds (UTC).
    #[arg(long)]
    pub end: i64,

    /// Maximum number of hourly samples.
    #[arg(long)]
    pub cnt: Option<u32>,
}

impl From<&Window> for HistoricalParameters {
    fn from(w: &Window) -> Self {
        HistoricalParameters { start: w.start, end: w.end, cnt: w.cnt }
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;

        if let Command::Configure = self.command {
            return configure(&mut config);
        }

        let client = config.build_client(self.unit)?;
        let data = fetch(&client, &self.command).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&data)?);
        } else {
            print_history(&client, &data);
        }

        Ok(())
    }
}

async fn fetch(client: &HistoricalClient, command: &Command) -> Result<HistoricalWeatherData> {
    let data = match command {
        Command::Configure => bail!("`configure` does not query the service"),
        Command::ByName { location } => client
            .history_by_name(location)
            .await
            .with_context(|| format!("Failed to fetch history for '{location}'"))?,
        Command::ById { id, window } => client
            .history_by_id(*id, &window.into())
            .await
            .with_context(|| format!("Failed to fetch history for city {id}"))?,
        Command::ByCoord { lat, lon, window } => {
            let coords = Coordinates { latitude: *lat, longitude: *lon };
            client
                .history_by_coord(&coords, &window.into())
                .await
                .with_context(|| format!("Failed to fetch history for {lat},{lon}"))?
        }
    };

    log::debug!("decoded {} samples", data.list.len());
    Ok(data)
}

fn configure(config: &mut Config) -> Result<()> {
    let api_key = Password::new("OpenWeatherMap API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let units: Vec<DataUnit> = DataUnit::all().to_vec();
    let unit = Select::new("Default unit:", units).prompt().context("Failed to read unit")?;

    config.set_api_key(api_key);
    config.unit = Some(unit.token().to_string());
    config.save()?;

    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

fn print_history(client: &HistoricalClient, data: &HistoricalWeatherData) {
    if data.is_empty() {
        println!("No historical data returned.");
        return;
    }

    let suffix = client.unit().temperature_suffix();
    println!("City {} ({} samples)", data.city_id, data.list.len());

    for sample in &data.list {
        println!(
            "{}  {:>6.1}{}  humidity {:>3}%  wind {:.1}  {}",
            format_time(sample.observed_at()),
            sample.main.temp,
            suffix,
            sample.main.humidity,
            sample.wind.speed,
            sample.condition(),
        );
    }
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "unknown time".to_string())
}
