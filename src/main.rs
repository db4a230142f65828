use vitalis::{auth::services, db, records, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "vitalis=debug,sqlx=warn".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;
    db::init_schema(&app_state.db).await?;

    let accounts = services::count(&app_state.db).await;
    let products = records::products::count(&app_state.db).await;
    let contact_messages = records::contact::count(&app_state.db).await;
    tracing::info!(accounts, products, contact_messages, "store ready");

    Ok(())
}
