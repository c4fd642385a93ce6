use clap::Parser;
use env_logger::Env;

use payload_build::{app, cli::Cli};

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let code = match app::run(cli) {
        Ok(code) => code,
        Err(err) => {
            println!("{err:#}");
            1
        }
    };
    std::process::exit(code);
}
