use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use weather_core::{
    Config, GithubStatusClient, OpenWeatherProvider, Overrides, Pipeline, Shutdown,
    config::DEFAULT_EXPIRATION_MINUTES,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-status",
    version,
    about = "Publish the current weather as your GitHub status"
)]
pub struct Cli {
    /// Enable debug logging, including raw API requests and responses.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Path to configuration file (defaults to the platform config dir).
    #[arg(short = 'c', long = "configuration", visible_alias = "config", global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Values that take precedence over the configuration file.
#[derive(Debug, Args)]
pub struct OverrideArgs {
    /// OpenWeather API key.
    #[arg(long, env = "WEATHER_STATUS_OWM_API_KEY", hide_env_values = true)]
    pub owm_api_key: Option<String>,

    /// GitHub token with the `user` scope.
    #[arg(long, env = "WEATHER_STATUS_GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Location query, e.g. "Berlin,DE".
    #[arg(long)]
    pub query: Option<String>,

    /// Status lifetime in minutes.
    #[arg(long)]
    pub expiration: Option<u32>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the weather and update the status once (the default).
    Run,

    /// Interactively write the configuration file.
    Configure,

    /// Print the default configuration file path.
    ConfigPath,
}

impl From<OverrideArgs> for Overrides {
    fn from(args: OverrideArgs) -> Self {
        Overrides {
            owm_api_key: args.owm_api_key,
            github_token: args.github_token,
            query: args.query,
            expiration_time: args.expiration,
        }
    }
}

impl Cli {
    pub async fn run(self, shutdown: Shutdown) -> anyhow::Result<()> {
        match self.command.unwrap_or(Command::Run) {
            Command::Run => {
                run_once(self.config.as_deref(), self.overrides.into(), self.debug, shutdown).await
            }
            Command::Configure => configure(self.config.as_deref()),
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
        }
    }
}

async fn run_once(
    path: Option<&Path>,
    overrides: Overrides,
    debug: bool,
    shutdown: Shutdown,
) -> anyhow::Result<()> {
    let mut config = Config::load(path).map_err(weather_core::Error::from)?;
    config.apply(overrides);
    let settings = config.into_settings().map_err(weather_core::Error::from)?;

    let http = weather_core::http_client(settings.timeout).context("failed to build HTTP client")?;
    let owm = OpenWeatherProvider::new(
        http.clone(),
        &settings.weather.endpoint,
        &settings.weather.api_key,
    )
    .with_protocol_log(debug);
    let gh = GithubStatusClient::new(http, &settings.status.endpoint, &settings.status.token)
        .with_recency_window(settings.status.recency_window)
        .with_protocol_log(debug);

    let report = Pipeline::new(&settings, &owm, &gh, shutdown).run().await?;

    let expires = report
        .result
        .expires_at
        .unwrap_or(report.request.expires_at)
        .with_timezone(&Local);
    info!(
        "status set to {} {} until {}",
        report.request.emoji,
        report.request.message,
        expires.format("%H:%M")
    );

    Ok(())
}

fn configure(path: Option<&Path>) -> anyhow::Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::config_file_path()?,
    };
    let mut config = if path.exists() {
        Config::load_from(&path)?
    } else {
        Config::default()
    };

    println!("Configuring {}", path.display());

    config.owm.api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()?;
    let query = config.owm.query.clone();
    config.owm.query = inquire::Text::new("Location query:")
        .with_default(&query)
        .with_help_message("City name, optionally with country code, e.g. Berlin,DE")
        .prompt()?;
    config.github.token = inquire::Password::new("GitHub token (needs the `user` scope):")
        .without_confirmation()
        .prompt()?;

    let current = match config.expiration_time {
        0 => DEFAULT_EXPIRATION_MINUTES,
        n => n,
    };
    config.expiration_time = inquire::CustomType::<u32>::new("Status expiration (minutes):")
        .with_default(current)
        .prompt()?;

    // Validate before writing so a bad answer never lands on disk.
    config.clone().into_settings()?;
    config.save(&path)?;

    println!("Saved configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_to_run() {
        let cli = Cli::try_parse_from(["weather-status"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.debug);
        assert!(cli.config.is_none());
    }

    #[test]
    fn parses_flags_and_overrides() {
        let cli = Cli::try_parse_from([
            "weather-status",
            "--debug",
            "--configuration",
            "/tmp/weather.toml",
            "--query",
            "Oslo",
            "--expiration",
            "15",
        ])
        .unwrap();

        assert!(cli.debug);
        assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/weather.toml")));

        let overrides = Overrides::from(cli.overrides);
        assert_eq!(overrides.query.as_deref(), Some("Oslo"));
        assert_eq!(overrides.expiration_time, Some(15));
    }

    #[test]
    fn config_alias_and_subcommand() {
        let cli = Cli::try_parse_from(["weather-status", "configure", "--config", "x.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Configure)));
        assert_eq!(cli.config.as_deref(), Some(Path::new("x.toml")));
    }
}
