use clap::Parser;
use cogproject::cli::Cli;
use cogproject::{logging, run, HostSession, NativeHost};
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    logging::init();

    let (request, host_config) = match Cli::parse().into_config().and_then(|c| c.into_parts()) {
        Ok(parts) => parts,
        Err(e) => {
            error!("An error occurred: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    let host = match NativeHost::init(host_config) {
        Ok(host) => host,
        Err(e) => {
            error!("An error occurred: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    let mut session = HostSession::new(host);
    let result = run(&mut session, &request);
    drop(session);

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => ExitCode::from(e.exit_code()),
    }
}
