use std::error::Error;

mod telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; deployed instances get real environment variables.
    let dotenv = dotenvy::dotenv();

    telemetry::init()?;

    if let Err(e) = &dotenv {
        if !e.not_found() {
            tracing::warn!(error = %e, ".env could not be loaded");
        }
    }

    api::start().await?;

    Ok(())
}
