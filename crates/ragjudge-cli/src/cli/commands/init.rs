use super::report_fatal;
use crate::cli::args::InitArgs;
use crate::exit_codes;
use ragjudge_core::config::write_sample_config;
use ragjudge_core::RunError;

pub fn run(args: InitArgs) -> anyhow::Result<i32> {
    if let Err(e) = write_sample_config(&args.path, args.force) {
        return Ok(report_fatal(&RunError::from(e)));
    }
    println!("Wrote {}", args.path.display());
    Ok(exit_codes::SUCCESS)
}
