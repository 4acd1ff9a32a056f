pub mod cli;
pub mod launcher;
pub mod locator;
pub mod manifest;
pub mod prompt;

/// Run the command line interface and return an exit code.
pub fn run_cli() -> i32 {
    cli::run()
}
