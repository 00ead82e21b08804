//! CLI entry point for the letter harvester.

use std::process::ExitCode;

use letter_harvester::exit::ProcessExit;

mod app;
mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    match app::runtime::run_harvester().await {
        Ok(exit) => exit.into(),
        Err(error) => {
            eprintln!("Error: {error:#}");
            ProcessExit::Failure.into()
        }
    }
}
