use clap::Parser;
use pacer_runtime::{init_logging, PacerCli, PacerRuntime};
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = PacerCli::parse();

    // Flushes the file writer when dropped; `process::exit` skips destructors.
    let guard = match init_logging(cli.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = PacerRuntime::new(cli).run().await {
        error!("{err}");
        drop(guard);
        std::process::exit(1);
    }
}
