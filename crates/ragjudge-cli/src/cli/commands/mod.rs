use super::args::*;

pub mod init;
pub(crate) mod run;

use crate::exit_codes::SUCCESS;
use ragjudge_core::RunError;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => run::run(args, cli.log.quiet).await,
        Command::Init(args) => init::run(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}

/// Print a fatal run error with its reason code and return the exit code.
pub(crate) fn report_fatal(err: &RunError) -> i32 {
    eprintln!("fatal [{}]: {}", err.reason_code(), err.message);
    crate::exit_codes::CONFIG_ERROR
}
