mod commands;
mod helpers;

use clap::Parser;
use sn_radial_core::domain::SnError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let run_error = error.as_sn_error();
            eprintln!("{}", run_error.diagnostic_line());
            eprintln!("{}", run_error.fatal_exit_line());
            run_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("sn-radial".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "sn-radial",
    version,
    about = "Radially symmetric Schrödinger–Newton integrator",
    long_about = "Integrates the radially symmetric Schrödinger–Newton equation with an implicit \
                  Crank–Nicolson step, writing periodic wavefunction snapshots below a \
                  timestamped run directory. Without a subcommand a fresh run is started. \
                  `analyze` tabulates observables of a finished run."
)]
struct Cli {
    #[command(flatten)]
    flags: commands::RunFlags,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Start a fresh run in a new timestamped directory
    #[command(visible_alias = "s")]
    Start(commands::StartArgs),
    /// Continue an earlier run from one of its snapshots
    #[command(visible_alias = "c")]
    Continue(commands::ContinueArgs),
    /// Tabulate r90, rmax and probability over a run's snapshots
    #[command(visible_alias = "a")]
    Analyze(commands::AnalyzeArgs),
}

fn dispatch_parsed(cli: Cli) -> Result<i32, CliError> {
    helpers::init_tracing(cli.flags.verbose);
    match cli.command {
        None => commands::run_start_command(&cli.flags, commands::StartArgs::default()),
        Some(CliCommand::Start(args)) => commands::run_start_command(&cli.flags, args),
        Some(CliCommand::Continue(args)) => commands::run_continue_command(&cli.flags, args),
        Some(CliCommand::Analyze(args)) => commands::run_analyze_command(&cli.flags, args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Run(SnError),
    /// Failure writing command output to stdout.
    #[error(transparent)]
    Output(#[from] anyhow::Error),
}

impl From<SnError> for CliError {
    fn from(error: SnError) -> Self {
        Self::Run(error)
    }
}

impl CliError {
    fn as_sn_error(&self) -> SnError {
        match self {
            Self::Usage(message) => {
                SnError::input_validation("INPUT.CLI_USAGE", message.trim_end().to_string())
            }
            Self::Run(error) => error.clone(),
            Self::Output(error) => SnError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
