pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;

mod cli;
mod demo;
mod routes;
mod server;

use error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
