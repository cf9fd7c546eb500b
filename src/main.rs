use dotenvy::dotenv;
use order_service::config::Config;
use order_service::{build_server, create_pool, run_migrations, AppState};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url)?;
    run_migrations(&pool)?;

    let state = AppState::from_pool(pool, &config);

    if let Some(admin) = &config.bootstrap_admin {
        let auth = state.auth.clone();
        let admin = admin.clone();
        actix_web::web::block(move || auth.ensure_admin_account(&admin.email, &admin.password))
            .await??;
    }

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(state, &config.host, config.port)?.await?;
    Ok(())
}
