use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::error;

use ldpair::cli::Cli;
use ldpair::error::{LdError, USER_ERROR};

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    match ldpair::run(&cli, &mut out) {
        Ok(()) => {
            if let Err(e) = out.flush() {
                error!("Failed to flush output: {e}");
                return ExitCode::from(USER_ERROR);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:?}");
            let code = e
                .downcast_ref::<LdError>()
                .map_or(USER_ERROR, LdError::exit_code);
            ExitCode::from(code)
        }
    }
}
