//! Entry point for the `lbs` command-line interface.
#![forbid(unsafe_code)]

use env_logger::Env;
use lbs_cli::CliError;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();
    if let Err(err) = lbs_cli::run() {
        if let CliError::ArgumentParsing(parse) = &err {
            parse.exit();
        }
        eprintln!("lbs: {err}");
        std::process::exit(1);
    }
}
