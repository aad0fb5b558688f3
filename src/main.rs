use std::error::Error;
use std::sync::Arc;

use gametracker::config::Config;
use gametracker::environment::Environment;
use gametracker::routes;
use gametracker::store::Backend;
use log::{info, initialize_logger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = Arc::new(initialize_logger());
    let config = Config::from_env()?;

    info!(logger, "Starting..."; "port" => config.port);

    let backend = Backend::select(&config, logger.clone()).await;
    let environment = Environment::new(logger.clone(), backend);

    if let Some(dir) = &config.frontend_dir {
        info!(logger, "Serving frontend"; "dir" => %dir.display());
    }

    let routes = routes::make_routes(environment, config.frontend_dir.clone());

    let (address, server) =
        warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], config.port), async {
            tokio::signal::ctrl_c().await.ok();
        });

    info!(logger, "Listening"; "address" => %address);
    server.await;

    info!(logger, "Exiting gracefully...");

    Ok(())
}
