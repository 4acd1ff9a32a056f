use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::launcher::{LaunchError, LaunchRequest, ScriptLauncher, Termination};
use crate::locator::{LocateError, find_manifests};
use crate::manifest::{ManifestLoad, load_manifest};
use crate::prompt::{
    Choice, MANIFEST_PROMPT, PromptError, Prompter, SCRIPT_PROMPT, TerminalPrompter, choose,
};

const EXIT_FAILURE: i32 = 1;
const EXIT_CANCELLED: i32 = 130;

#[derive(Debug, Parser)]
#[command(
    name = "pkgrun",
    version,
    about = "Find package.json files, pick one, and run one of its scripts"
)]
pub struct Cli {
    /// The directory to start the search from
    #[arg(default_value = ".")]
    dir: PathBuf,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Everything a run needs, resolved once from the command line.
#[derive(Debug, Clone)]
pub struct Config {
    pub search_root: PathBuf,
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Self {
            search_root: cli.dir.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NoManifests,
    NoScripts { manifest: PathBuf },
    Finished(Termination),
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::NoManifests | Outcome::NoScripts { .. } => 0,
            Outcome::Finished(termination) => termination.exit_code(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Locate(#[from] LocateError),
    #[error("failed to load {}: {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Launch(#[from] LaunchError),
}

impl RunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Prompt(PromptError::Cancelled) => EXIT_CANCELLED,
            RunError::Launch(err) => err.exit_code(),
            RunError::Locate(_) | RunError::Manifest { .. } | RunError::Prompt(_) => EXIT_FAILURE,
        }
    }
}

/// locate, pick a manifest, read it, pick a script, launch it and wait.
pub fn run_pipeline<P>(
    config: &Config,
    prompter: &mut P,
    launcher: &ScriptLauncher,
) -> Result<Outcome, RunError>
where
    P: Prompter + ?Sized,
{
    let manifests = find_manifests(&config.search_root)?;
    if manifests.is_empty() {
        println!("No package.json files were found.");
        return Ok(Outcome::NoManifests);
    }

    let choices = manifests
        .into_iter()
        .map(|path| Choice::new(path.display().to_string(), path))
        .collect();
    let selected = choose(prompter, MANIFEST_PROMPT, choices)?;

    let manifest = match load_manifest(&selected) {
        ManifestLoad::Parsed(manifest) => manifest,
        failed => {
            return Err(RunError::Manifest {
                reason: failed.describe_failure().unwrap_or_default(),
                path: selected,
            });
        }
    };

    let scripts = manifest.script_entries();
    if scripts.is_empty() {
        println!("No scripts found in the package.json file.");
        return Ok(Outcome::NoScripts { manifest: selected });
    }

    let choices = scripts
        .into_iter()
        .map(|entry| Choice::new(entry.label(), entry.name))
        .collect();
    let script = choose(prompter, SCRIPT_PROMPT, choices)?;

    let request = LaunchRequest::for_manifest(&selected, script);
    let termination = launcher.launch(&request)?;
    Ok(Outcome::Finished(termination))
}

fn init_tracing(verbose: u8) -> anyhow::Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("initialising logging: {err}"))
}

/// Parse arguments, run the pipeline against the real terminal, and return the exit code.
pub fn run() -> i32 {
    let cli = Cli::parse();
    if let Err(err) = init_tracing(cli.verbose) {
        eprintln!("warning: {err:#}");
    }

    let config = Config::from(&cli);
    let mut prompter = TerminalPrompter::new();
    let launcher = ScriptLauncher::for_host();

    match run_pipeline(&config, &mut prompter, &launcher) {
        Ok(outcome) => outcome.exit_code(),
        Err(RunError::Prompt(PromptError::Cancelled)) => {
            eprintln!("Selection cancelled.");
            EXIT_CANCELLED
        }
        Err(err) => {
            let code = err.exit_code();
            eprintln!("error: {:#}", anyhow::Error::new(err));
            code
        }
    }
}
