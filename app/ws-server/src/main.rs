use anyhow::Result;
use std::env;
use std::sync::Arc;
use tokio::net::TcpListener;
use wsfu::sfu::sfu;
use wsfu::sfu::sfu::SFU;

mod engine;
mod gateway;

#[tokio::main]
async fn main() -> Result<()> {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config_path = String::from("./app/ws-server/src/config.toml");
    let config = sfu::load(&config_path);
    match config {
        Err(err) => {
            log::error!("configure error: {}", err);
            log::warn!("please check the configure file path: {}", config_path);
        }
        Ok(c) => {
            let sfu = SFU::new();
            let factory: Arc<dyn wsfu::sfu::engine::EngineFactory + Send + Sync> =
                Arc::new(engine::NoopEngineFactory::default());

            let addr = format!("0.0.0.0:{}", c.ws.port());
            let listener = TcpListener::bind(&addr).await.expect("Can't listen");

            log::info!("sfu server running on ws://{}", addr);

            loop {
                if let Ok((stream, _)) = listener.accept().await {
                    let sfu_out = sfu.clone();
                    let factory_out = factory.clone();
                    tokio::spawn(async move {
                        if let Err(err) =
                            gateway::handle_connection(stream, sfu_out, factory_out).await
                        {
                            log::error!("connection error: {}", err);
                        }
                    });
                }
            }
        }
    }

    Ok(())
}
