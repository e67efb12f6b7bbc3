mod args;
mod ridings;

use clap::Parser;
use log::{debug, error};

use crate::args::Args;

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    debug!("main: args: {:?}", args);

    if let Err(e) = ridings::run_analysis(&args) {
        error!("Error occured {:?}", e);
        eprintln!("An error occured: {}", e);
        std::process::exit(1);
    }
}
