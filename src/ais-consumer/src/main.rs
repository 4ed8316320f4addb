use ais_consumer::{settings::Settings, startup::App};
use cablewatch_core::{init_tracer, shutdown_signal};
use tokio_util::sync::CancellationToken;
use tracing::error;

#[tokio::main]
async fn main() {
    let settings = match Settings::new() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to load settings: {e}");
            std::process::exit(1);
        }
    };

    init_tracer(&settings.log_level, "cablewatch-ais-consumer");

    let app = match App::build(&settings).await {
        Ok(app) => app,
        Err(e) => {
            error!("failed to start ais consumer: {e:?}");
            std::process::exit(1);
        }
    };

    let cancellation = CancellationToken::new();
    let token = cancellation.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        token.cancel();
    });

    if let Err(e) = app.run(cancellation).await {
        error!("ais consumer failed: {e:?}");
        std::process::exit(1);
    }
}
