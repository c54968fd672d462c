mod batch;
mod cli;
mod infra;
mod routes;
mod server;

use valora::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
