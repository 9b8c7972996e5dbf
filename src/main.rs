//! plugshelf - manage a directory of plugin bundles

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = plugshelf::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
