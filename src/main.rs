//! ONTAP REST Client CLI
//!
//! Small inspection tool over [`ontap_rest::RestClient`]. Connection
//! settings come from a YAML config file, overridable by flags and
//! environment variables. Results are printed as JSON.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ontap_rest::{ClientConfig, RestClient};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Query an ONTAP cluster through its REST API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML client configuration
    #[arg(long, env = "ONTAP_CONFIG")]
    config: Option<PathBuf>,

    /// Management LIF address, overrides the config file
    #[arg(long, env = "ONTAP_MANAGEMENT_LIF")]
    management_lif: Option<String>,

    #[arg(long, env = "ONTAP_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "ONTAP_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// SVM to operate on
    #[arg(long, env = "ONTAP_SVM")]
    svm: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the cluster ONTAP version
    Version,
    /// List SVMs
    Svms {
        #[arg(default_value = "*")]
        pattern: String,
    },
    /// List FlexVol volumes of the SVM
    Volumes {
        #[arg(default_value = "*")]
        pattern: String,
    },
    /// List aggregates
    Aggregates {
        #[arg(default_value = "*")]
        pattern: String,
    },
    /// List data LIF addresses serving a protocol (nfs, iscsi, ...)
    Lifs { protocol: String },
    /// Show a job
    Job { uuid: String },
}

impl Command {
    fn svm_scoped(&self) -> bool {
        matches!(self, Command::Volumes { .. } | Command::Lifs { .. })
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let config = load_config(&args)?;
    info!(
        version = ontap_rest::VERSION,
        management_lif = %config.management_lif,
        "Starting {}",
        ontap_rest::NAME
    );

    let client = RestClient::new(config).context("failed to create REST client")?;

    if args.command.svm_scoped() {
        let svm = client.ensure_svm().await.context("failed to resolve SVM")?;
        debug!(svm = ?svm.name, uuid = ?svm.uuid, "Resolved SVM");
    }

    let result = run(&client, &args.command).await;
    debug!(metrics = ?client.metrics().snapshot(), "Client metrics");
    result
}

async fn run(client: &RestClient, command: &Command) -> anyhow::Result<()> {
    match command {
        Command::Version => {
            let version = client.system_get_ontap_version().await?;
            print_json(&serde_json::json!({ "version": version }))
        }
        Command::Svms { pattern } => print_json(&client.svm_list(pattern).await?.records),
        Command::Volumes { pattern } => print_json(&client.volume_list(pattern).await?),
        Command::Aggregates { pattern } => {
            print_json(&client.aggregate_list(pattern).await?.records)
        }
        Command::Lifs { protocol } => {
            print_json(&client.net_interface_get_data_lifs(protocol).await?)
        }
        Command::Job { uuid } => print_json(&client.job_get(uuid).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// Configuration
// =============================================================================

fn load_config(args: &Args) -> anyhow::Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };

    if let Some(lif) = &args.management_lif {
        config.management_lif = lif.clone();
    }
    if let Some(username) = &args.username {
        config.username = username.clone();
    }
    if let Some(password) = &args.password {
        config.password = password.clone();
    }
    if let Some(svm) = &args.svm {
        config.svm = Some(svm.clone());
    }

    config.validate()?;
    Ok(config)
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "reqwest=info", "rustls=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    // Logs go to stderr so stdout stays parseable JSON
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "ontap-rest",
            "--management-lif",
            "10.0.0.1",
            "--username",
            "admin",
            "--password",
            "secret",
            "--svm",
            "svm0",
            "volumes",
        ]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.management_lif, "10.0.0.1");
        assert_eq!(config.svm.as_deref(), Some("svm0"));
        assert!(config.has_basic_auth());
        assert!(args.command.svm_scoped());
    }

    #[test]
    fn test_missing_lif_rejected() {
        let args = Args {
            config: None,
            management_lif: None,
            username: Some("admin".into()),
            password: Some("secret".into()),
            svm: None,
            log_level: "info".into(),
            log_json: false,
            command: Command::Version,
        };
        assert!(load_config(&args).is_err());
        assert!(!args.command.svm_scoped());
    }
}
