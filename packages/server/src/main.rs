use anyhow::Context as _;

mod app;
mod routes;
mod settings;
mod telemetry;

use settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init()?;

    let settings = Settings::new().context("Failed to load settings")?;
    app::run(settings).await
}
