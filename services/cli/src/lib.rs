mod bonus;
mod cli;
mod infra;
mod pairing;
mod report;
mod session;

use picata::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
