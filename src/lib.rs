pub mod application;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::{AuthService, OrderService};
use auth::TokenService;
use config::Config;
use domain::ports::{OrderRepository, UserRepository};
use infrastructure::{DieselOrderRepository, DieselUserRepository};

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Services shared by every worker. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub orders: OrderService,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        orders: Arc<dyn OrderRepository>,
        tokens: TokenService,
    ) -> Self {
        Self {
            auth: AuthService::new(users, tokens),
            orders: OrderService::new(orders),
        }
    }

    /// Wire the Postgres repositories behind `pool`.
    pub fn from_pool(pool: DbPool, config: &Config) -> Self {
        Self::new(
            Arc::new(DieselUserRepository::new(pool.clone())),
            Arc::new(DieselOrderRepository::new(pool)),
            TokenService::new(
                &config.secret_key,
                config.access_token_ttl(),
                config.jwt_leeway_secs,
            ),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::home,
        handlers::auth::signup,
        handlers::auth::login,
        handlers::auth::login_form,
        handlers::auth::refresh,
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::list_my_orders,
        handlers::orders::get_order,
        handlers::orders::add_item,
        handlers::orders::remove_item,
        handlers::orders::finalize_order,
        handlers::orders::cancel_order,
    ),
    tags(
        (name = "auth", description = "Accounts and bearer tokens"),
        (name = "orders", description = "Orders and their items"),
    )
)]
pub struct ApiDoc;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

/// Register every route. Expects `web::Data<AppState>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("", web::get().to(handlers::auth::home))
            .route("/signup", web::post().to(handlers::auth::signup))
            .route("/login", web::post().to(handlers::auth::login))
            .route("/login-form", web::post().to(handlers::auth::login_form))
            .route("/refresh", web::get().to(handlers::auth::refresh)),
    )
    .service(
        web::scope("/orders")
            .route("", web::post().to(handlers::orders::create_order))
            .route("", web::get().to(handlers::orders::list_orders))
            .route("/mine", web::get().to(handlers::orders::list_my_orders))
            .route("/items/{item_id}", web::delete().to(handlers::orders::remove_item))
            .route("/{id}", web::get().to(handlers::orders::get_order))
            .route("/{id}/items", web::post().to(handlers::orders::add_item))
            .route("/{id}/finalize", web::post().to(handlers::orders::finalize_order))
            .route("/{id}/cancel", web::post().to(handlers::orders::cancel_order)),
    );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default())
            .configure(configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
