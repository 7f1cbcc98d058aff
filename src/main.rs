use clap::Parser;
use signalpulse::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
