//! Application entry: binds the product stack to the target environment and
//! synthesizes the deployment artifacts.

mod docs;
mod stack;

use cirrus_sdk::{App, Environment};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cirrus_sdk=info,product_infra=info")),
        )
        .init();

    let env = Environment::from_env()?;
    let mut app = App::new();
    app.add_stack(stack::declare(env)?);
    let outdir = app.synth()?;
    tracing::info!(outdir = %outdir.display(), "synthesis complete");
    Ok(())
}
