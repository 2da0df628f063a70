//! Argument parsing and command dispatch for `visamapctl`.

use clap::{Args, Parser, Subcommand, ValueEnum};
use reqwest::Url;
use uuid::Uuid;

use crate::client::{AppContext, CliDependencies, CliResult, parse_url};
use crate::commands::policies::{handle_delete, handle_list, handle_login, handle_set};
use crate::commands::publish::{handle_lookup, handle_publish};

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_API_URL: &str = "http://127.0.0.1:7070";

/// Parses CLI arguments and executes the requested command.
/// Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let trace_id = Uuid::new_v4().to_string();
    let deps = match CliDependencies::from_cli(&cli, &trace_id) {
        Ok(deps) => deps,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            return err.exit_code();
        }
    };

    match dispatch(cli, &deps).await {
        Ok(()) => 0,
        Err(err) => {
            tracing::debug!(trace_id = %trace_id, "command failed");
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli, deps: &CliDependencies) -> CliResult<()> {
    let ctx = AppContext {
        client: deps.client.clone(),
        base_url: cli.api_url,
        password: cli.password.filter(|value| !value.is_empty()),
    };

    match cli.command {
        Command::Login => handle_login(&ctx).await,
        Command::Ls(args) => handle_list(&ctx, args, cli.output).await,
        Command::Set(args) => handle_set(&ctx, args, cli.output).await,
        Command::Rm(args) => handle_delete(&ctx, args).await,
        Command::Publish => handle_publish(&ctx, cli.output).await,
        Command::Lookup(args) => handle_lookup(&ctx, args, cli.output).await,
    }
}

#[derive(Parser)]
#[command(name = "visamapctl", about = "Administrative CLI for a visamap server")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "VISAMAP_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    pub(crate) api_url: Url,
    #[arg(long, global = true, env = "VISAMAP_ADMIN_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,
    #[arg(
        long,
        global = true,
        env = "VISAMAP_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Check the admin password against the server.
    Login,
    /// List stored policy entries.
    Ls(ListArgs),
    /// Insert or replace one entry.
    Set(SetArgs),
    /// Delete one entry.
    Rm(KeyArgs),
    /// Regenerate the published artifacts.
    Publish,
    /// Read the published values for one pair.
    Lookup(KeyArgs),
}

#[derive(Args, Default)]
pub(crate) struct ListArgs {
    #[arg(long, alias = "passport")]
    pub(crate) origin: Option<String>,
    #[arg(long)]
    pub(crate) destination: Option<String>,
}

#[derive(Args)]
pub(crate) struct SetArgs {
    #[arg(help = "Passport-issuing country")]
    pub(crate) origin: String,
    #[arg(help = "Destination country")]
    pub(crate) destination: String,
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=15))]
    pub(crate) policy: u8,
    #[arg(long)]
    pub(crate) duration: Option<u32>,
}

#[derive(Args)]
pub(crate) struct KeyArgs {
    #[arg(help = "Passport-issuing country")]
    pub(crate) origin: String,
    #[arg(help = "Destination country")]
    pub(crate) destination: String,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}
