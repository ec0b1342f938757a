// # cfzonectl - CDN zone control
//
// Thin command-line shell over cfzone-core. All zone logic lives in the
// library; this binary only:
// 1. Parses options (flags or environment variables)
// 2. Initializes logging and the runtime
// 3. Registers vendor providers
// 4. Wires the stores, the resolver and the settings client together
//
// ## Configuration
//
// - `CFZONE_CONFIG_FILE`: Persisted settings (API key, email, zone)
// - `CFZONE_STATE_FILE`: Rate counter state
// - `CFZONE_API_BASE`: Override of the vendor API base URL
// - `CFZONE_LOG_LEVEL`: Log filter (default `info`)
// - `CFZONE_SETTINGS_URL`: Settings location named in diagnostics
//
// ## Example
//
// ```bash
// cfzonectl configure --api-key "$CF_KEY" --email ops@example.com
// cfzonectl zone show
// cfzonectl settings set security_level '"high"'
// cfzonectl rate
// ```

use anyhow::{Context, Result};
use cfzone_core::traits::{RateState, TracingDiagnostics};
use cfzone_core::{
    ConfigStore, CoreConfig, CredentialStore, FileConfigStore, FileRateState, SettingsForm,
    ZoneApiRegistry, ZoneDirectoryResolver, ZoneSettingsClient,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Exit codes for different termination scenarios
///
/// - 0: Success
/// - 1: Configuration error (missing credentials, no zone, bad options)
/// - 2: Runtime error (vendor or storage failure)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CtlExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<CtlExitCode> for ExitCode {
    fn from(code: CtlExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl CtlExitCode {
    /// Classify a failure by its root cfzone error, if any
    fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<cfzone_core::Error>() {
            Some(
                cfzone_core::Error::MissingCredentials(_)
                | cfzone_core::Error::AmbiguousOrMissingZone { .. }
                | cfzone_core::Error::Config(_)
                | cfzone_core::Error::InvalidInput(_),
            ) => CtlExitCode::ConfigError,
            _ => CtlExitCode::RuntimeError,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "cfzonectl", version, about = "Manage a Cloudflare zone's settings")]
struct Cli {
    /// Persisted settings file (API key, email, selected zone)
    #[arg(long, env = "CFZONE_CONFIG_FILE", default_value = "cfzone.json", global = true)]
    config_file: PathBuf,

    /// Rate counter state file
    #[arg(long, env = "CFZONE_STATE_FILE", default_value = "cfzone-rate.json", global = true)]
    state_file: PathBuf,

    /// Vendor API base URL
    #[arg(long, env = "CFZONE_API_BASE", global = true)]
    api_base: Option<String>,

    /// Log filter, e.g. `info` or `cfzone_core=debug`
    #[arg(long, env = "CFZONE_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Settings location named in diagnostics
    #[arg(
        long,
        env = "CFZONE_SETTINGS_URL",
        default_value = cfzone_core::config::DEFAULT_SETTINGS_URL,
        global = true
    )]
    settings_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate and save API credentials
    Configure {
        /// Global API key or API token
        #[arg(long, env = "CFZONE_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Account email (required for global API keys)
        #[arg(long)]
        email: Option<String>,
    },

    /// Inspect or choose the managed zone
    #[command(subcommand)]
    Zone(ZoneCommand),

    /// Read or change zone settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Show the API rate counters
    Rate,
}

#[derive(Debug, Subcommand)]
enum ZoneCommand {
    /// Print the managed zone, discovering it if the account has only one
    Show,
    /// List the zones visible to the credentials
    List,
    /// Use the given zone from now on
    Select {
        /// Zone id as listed by `zone list`
        zone_id: String,
    },
}

#[derive(Debug, Subcommand)]
enum SettingsCommand {
    /// Print all settings, or a single one
    Get {
        /// Setting name, e.g. `security_level`
        name: Option<String>,
    },
    /// Change a single setting
    Set {
        /// Setting name, e.g. `security_level`
        name: String,
        /// New value as JSON; bare words are taken as strings
        value: String,
    },
}

impl Cli {
    /// Runtime configuration derived from the options
    fn core_config(&self) -> Result<CoreConfig> {
        let mut config = CoreConfig::new().with_settings_url(&self.settings_url);
        if let Some(ref base) = self.api_base {
            config.provider = config.provider.with_api_base(base);
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match EnvFilter::try_new(&cli.log_level) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("Invalid CFZONE_LOG_LEVEL '{}': {}", cli.log_level, e);
            return CtlExitCode::ConfigError.into();
        }
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CtlExitCode::ConfigError.into();
    }

    let config = match cli.core_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return CtlExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CtlExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(run(cli, config));

    match result {
        Ok(()) => CtlExitCode::Success.into(),
        Err(e) => {
            error!("{:#}", e);
            CtlExitCode::for_error(&e).into()
        }
    }
}

async fn run(cli: Cli, config: CoreConfig) -> Result<()> {
    let store = Arc::new(
        FileConfigStore::new(&cli.config_file)
            .await
            .with_context(|| format!("Failed to open {}", cli.config_file.display()))?,
    );

    match cli.command {
        Command::Configure { api_key, email } => configure(store, &api_key, email.as_deref()).await,
        Command::Rate => {
            let rate_state = FileRateState::new(&cli.state_file, config.rate_limits.clone()).await?;
            show_rate(&rate_state, &config).await
        }
        Command::Zone(cmd) => {
            let app = App::build(store, &cli.state_file, &config).await?;
            app.zone(cmd).await
        }
        Command::Settings(cmd) => {
            let app = App::build(store, &cli.state_file, &config).await?;
            app.settings(cmd).await
        }
    }
}

async fn configure(store: Arc<FileConfigStore>, api_key: &str, email: Option<&str>) -> Result<()> {
    let form = SettingsForm::new(api_key, email);
    let outcome = form.submit(store.as_ref()).await?;
    println!("Saved credentials to {}", store.path().display());
    if outcome.zone_cleared {
        println!("API key changed: the stored zone was cleared and will be resolved again");
    }
    Ok(())
}

async fn show_rate(rate_state: &FileRateState, config: &CoreConfig) -> Result<()> {
    let counters = rate_state.snapshot().await?;
    let limits = &config.rate_limits;

    println!(
        "API calls:  {} / {} (window since {})",
        counters.api_call_count_in_window, limits.api_calls_per_window, counters.window_start
    );
    println!(
        "Tag purges: {} / {} (on {})",
        counters.tag_purge_count_today, limits.tag_purges_per_day, counters.tag_purge_day
    );
    Ok(())
}

/// Components wired over the persisted settings
struct App {
    credentials: Arc<CredentialStore>,
    resolver: Arc<ZoneDirectoryResolver>,
    client: ZoneSettingsClient,
}

impl App {
    async fn build(
        store: Arc<FileConfigStore>,
        state_file: &Path,
        config: &CoreConfig,
    ) -> Result<Self> {
        let credentials = Arc::new(
            CredentialStore::load(
                store as Arc<dyn ConfigStore>,
                Arc::new(TracingDiagnostics),
                config,
            )
            .await?,
        );

        if !credentials.has_valid_credentials() {
            return Err(cfzone_core::Error::missing_credentials(
                "Run `cfzonectl configure` first",
            )
            .into());
        }

        let registry = ZoneApiRegistry::new();

        #[cfg(feature = "cloudflare")]
        {
            tracing::debug!("Registering Cloudflare provider");
            cfzone_provider_cloudflare::register(&registry);
        }

        let api = registry.create_zone_api(&credentials.credentials().await, &config.provider)?;
        let rate_state: Arc<dyn RateState> =
            Arc::new(FileRateState::new(state_file, config.rate_limits.clone()).await?);

        let resolver = Arc::new(ZoneDirectoryResolver::new(
            credentials.clone(),
            api.clone(),
            rate_state.clone(),
        ));
        let client = ZoneSettingsClient::new(credentials.clone(), resolver.clone(), api, rate_state);

        Ok(Self {
            credentials,
            resolver,
            client,
        })
    }

    async fn zone(&self, cmd: ZoneCommand) -> Result<()> {
        match cmd {
            ZoneCommand::Show => {
                let zone_id = self.resolver.try_resolve_zone_id().await?;
                println!("{}", zone_id);
            }
            ZoneCommand::List => {
                let zones = self.resolver.list_zones().await?.unwrap_or_default();
                let current = self.credentials.zone_id().await;
                for zone in zones {
                    let marker = if current.as_deref() == Some(zone.id.as_str()) {
                        "*"
                    } else {
                        " "
                    };
                    println!("{} {}  {}  {}", marker, zone.id, zone.name, zone.status);
                }
            }
            ZoneCommand::Select { zone_id } => {
                self.credentials.set_zone_id(&zone_id).await?;
                info!("Selected zone {}", zone_id);
            }
        }
        Ok(())
    }

    async fn settings(&self, cmd: SettingsCommand) -> Result<()> {
        let mut settings = self
            .client
            .get_zone_settings()
            .await?
            .context("No zone settings available")?;

        match cmd {
            SettingsCommand::Get { name: None } => {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            }
            SettingsCommand::Get { name: Some(name) } => {
                let value = settings
                    .value(&name)
                    .with_context(|| format!("Unknown zone setting '{}'", name))?;
                println!("{}", serde_json::to_string_pretty(value)?);
            }
            SettingsCommand::Set { name, value } => {
                settings.set(&name, parse_value(&value))?;
                self.client.update_zone_settings(&settings).await?;
                info!("Updated {} on zone {}", name, settings.zone_id);
            }
        }
        Ok(())
    }
}

/// Parse a setting value, taking anything that isn't JSON as a plain string
fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_settings_set() {
        let cli = Cli::try_parse_from([
            "cfzonectl",
            "--config-file",
            "/tmp/s.json",
            "settings",
            "set",
            "security_level",
            "high",
        ])
        .unwrap();

        assert_eq!(cli.config_file, PathBuf::from("/tmp/s.json"));
        match cli.command {
            Command::Settings(SettingsCommand::Set { name, value }) => {
                assert_eq!(name, "security_level");
                assert_eq!(value, "high");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("high"), serde_json::json!("high"));
        assert_eq!(parse_value("\"on\""), serde_json::json!("on"));
        assert_eq!(parse_value("30"), serde_json::json!(30));
        assert_eq!(
            parse_value(r#"{"enabled":true}"#),
            serde_json::json!({"enabled": true})
        );
    }

    #[test]
    fn test_exit_codes() {
        let missing: anyhow::Error = cfzone_core::Error::missing_credentials("no key").into();
        assert_eq!(CtlExitCode::for_error(&missing), CtlExitCode::ConfigError);

        let ambiguous: anyhow::Error = cfzone_core::Error::ambiguous_zone(3).into();
        assert_eq!(CtlExitCode::for_error(&ambiguous), CtlExitCode::ConfigError);

        let upstream: anyhow::Error = cfzone_core::Error::upstream("cloudflare", "boom").into();
        assert_eq!(CtlExitCode::for_error(&upstream), CtlExitCode::RuntimeError);

        let other = anyhow::anyhow!("disk on fire");
        assert_eq!(CtlExitCode::for_error(&other), CtlExitCode::RuntimeError);
    }

    #[tokio::test]
    async fn test_configure_rejects_invalid_form() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileConfigStore::new(dir.path().join("cfzone.json")).await.unwrap());

        let err = configure(store.clone(), "", Some("not-an-email"))
            .await
            .unwrap_err();
        assert_eq!(CtlExitCode::for_error(&err), CtlExitCode::ConfigError);

        let message = format!("{:#}", err);
        assert!(message.contains("api_key"));
        assert!(message.contains("email"));
        assert!(store.all().await.unwrap().is_empty());
    }

    #[test]
    fn test_core_config_from_flags() {
        let cli = Cli::try_parse_from([
            "cfzonectl",
            "--api-base",
            "http://localhost:8080/client/v4",
            "--settings-url",
            "/settings/cdn",
            "rate",
        ])
        .unwrap();

        let config = cli.core_config().unwrap();
        assert_eq!(config.settings_url, "/settings/cdn");
        assert_eq!(
            config.provider.api_base.as_deref(),
            Some("http://localhost:8080/client/v4")
        );

        let bad = Cli::try_parse_from(["cfzonectl", "--api-base", "ftp://nope", "rate"]).unwrap();
        assert!(bad.core_config().is_err());
    }
}
