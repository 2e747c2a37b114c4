use anyhow::Result;

use quick_clinic_push::cli::CliApp;

#[tokio::main]
async fn main() -> Result<()> {
    CliApp::run().await
}
