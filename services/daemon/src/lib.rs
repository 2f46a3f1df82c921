mod cli;
mod infra;
mod routes;
mod server;

use legis_tracker::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
