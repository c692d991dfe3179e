use clap::Parser;
use glidepath::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
