//! cmeta: query and mine Claude Code session transcripts from the command line.

use std::process::ExitCode;

use claude_meta::cli;

fn main() -> ExitCode {
    // Logging is initialized by cli::run from --log-level and --log-format
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let show_source = std::env::var("RUST_BACKTRACE").is_ok();
            // Nothing useful is left to do if stderr itself fails.
            let _ = cli::report_error(&mut std::io::stderr().lock(), &e, show_source);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
