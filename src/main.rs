use std::process::ExitCode;

use resultstore::ui::output;

fn main() -> ExitCode {
    match resultstore::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
