mod args;
mod irr;

use clap::Parser;
use log::{debug, LevelFilter};
use snafu::ErrorCompat;

fn main() {
    let args = args::Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }
    debug!("args: {:?}", args);

    let res = irr::run_analysis(&args);
    if let Err(e) = res {
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
