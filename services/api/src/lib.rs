mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use park_net::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
