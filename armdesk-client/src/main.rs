use armdesk_client::{Cli, run};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), armdesk_client::AppError> {
    run(Cli::parse()).await
}
