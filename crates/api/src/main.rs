use stockbook_api::config::Config;
use stockbook_store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockbook_observability::init();

    let config = Config::load();

    let store = Store::connect(&config.database_url).await?;
    store.migrate().await?;

    let app = stockbook_api::app::build_app(store, &config.password);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
