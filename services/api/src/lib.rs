mod cli;
mod infra;
mod routes;
mod server;

use autocare::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
