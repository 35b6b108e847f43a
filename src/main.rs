use applogs::cli::run::{self, DumpArgs, Overrides};
use applogs::DumpOutcome;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "applogs")]
#[command(about = "Retrieve aggregated container logs", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root of the aggregated log tree, overriding the config file
    #[arg(long, global = true)]
    log_root: Option<PathBuf>,

    /// Directory level between owner and application, overriding the config file
    #[arg(long, global = true)]
    suffix: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the logs of one container
    Dump {
        #[arg(long = "app")]
        app_id: String,
        #[arg(long = "container")]
        container_id: String,
        /// Only scan node files of this node (host:port)
        #[arg(long = "node")]
        node_id: Option<String>,
        /// Only print these log types; repeat or separate with commas
        #[arg(long = "log-type", value_delimiter = ',')]
        log_types: Vec<String>,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Print the logs of every container of an application
    DumpAll {
        #[arg(long = "app")]
        app_id: String,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Print log types and sizes without contents
    Metadata {
        #[arg(long = "app")]
        app_id: String,
        #[arg(long = "container")]
        container_id: Option<String>,
        #[arg(long = "node")]
        node_id: Option<String>,
        #[arg(long)]
        owner: Option<String>,
    },
    /// List the node files that aggregated logs for an application
    Nodes {
        #[arg(long = "app")]
        app_id: String,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Find the user whose directory holds an application's logs
    Owner {
        #[arg(long = "app")]
        app_id: String,
        /// Best guess, defaults to the current user
        #[arg(long)]
        owner: Option<String>,
    },
    /// Write a node file from container log directories
    Pack {
        #[arg(long)]
        output: PathBuf,
        /// <container id>=<log dir>, repeatable
        #[arg(long = "container", required = true)]
        containers: Vec<String>,
    },
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Init {
        #[arg(long)]
        stdout: bool,
    },
    Validate,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Diagnostics go to stderr so stdout carries only log content
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "applogs=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let overrides = Overrides {
        config_path: cli.config,
        log_root: cli.log_root,
        suffix: cli.suffix,
    };

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();

    let outcome = match cli.command {
        Commands::Dump {
            app_id,
            container_id,
            node_id,
            log_types,
            owner,
        } => {
            let args = DumpArgs {
                app_id: &app_id,
                container_id: &container_id,
                node_id: node_id.as_deref(),
                log_types: &log_types,
                owner: owner.as_deref(),
            };
            run::dump(run::load_settings(&overrides)?, &args, &mut out, &mut err)?
        }
        Commands::DumpAll { app_id, owner } => run::dump_all(
            run::load_settings(&overrides)?,
            &app_id,
            owner.as_deref(),
            &mut out,
            &mut err,
        )?,
        Commands::Metadata {
            app_id,
            container_id,
            node_id,
            owner,
        } => run::metadata(
            run::load_settings(&overrides)?,
            &app_id,
            container_id.as_deref(),
            node_id.as_deref(),
            owner.as_deref(),
            &mut out,
            &mut err,
        )?,
        Commands::Nodes { app_id, owner } => run::nodes(
            run::load_settings(&overrides)?,
            &app_id,
            owner.as_deref(),
            &mut out,
            &mut err,
        )?,
        Commands::Owner { app_id, owner } => run::owner(
            run::load_settings(&overrides)?,
            &app_id,
            owner.as_deref(),
            &mut out,
            &mut err,
        )?,
        Commands::Pack { output, containers } => {
            applogs::cli::pack::pack(&output, &containers, &mut out)?;
            DumpOutcome::Found
        }
        Commands::Config { action } => {
            match action {
                ConfigAction::Init { stdout } => applogs::cli::config::init(stdout, &mut out)?,
                ConfigAction::Validate => {
                    let path = applogs::config::config_file(overrides.config_path.as_deref());
                    applogs::cli::config::validate(path.as_deref(), &mut out)?
                }
            }
            DumpOutcome::Found
        }
    };

    out.flush()?;
    err.flush()?;
    if !outcome.is_found() {
        std::process::exit(outcome.code());
    }

    Ok(())
}
