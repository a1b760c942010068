use clap::Parser;
use transfermarket::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
