use clap::Parser;
use tickscore::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
