use clap::Parser;
use tickerscore::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
