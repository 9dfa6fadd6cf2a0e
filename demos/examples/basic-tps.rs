use pacer::prelude::*;
use reqwest::Client;
use std::sync::OnceLock;
use tracing_subscriber::FmtSubscriber;

static CLIENT: OnceLock<Client> = OnceLock::new();

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter("pacer=debug")
        .init();

    let config = RunConfig::new(100, 30, 2.)?.with_name("delay_10ms");
    let report = Scheduler::new(config, api_a).run().await;

    println!("{report}");
    Ok(())
}

async fn api_a() -> Result<(), reqwest::Error> {
    let client = CLIENT.get_or_init(Client::new);
    client
        .get("http://0.0.0.0:3002/delay/ms/10")
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}
