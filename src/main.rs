use clap::Parser;
use sdw_etl::{cli, logging, Args};
use std::process::ExitCode;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    logging::init_logging(args.verbose);

    match cli::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", cli::exit_message(&e));
            ExitCode::FAILURE
        }
    }
}
