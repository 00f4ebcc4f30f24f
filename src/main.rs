mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use axum::http::{header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE}, HeaderValue, Method};
use config::Config;
use db::db::{DBClient, HelpdeskDb};
use dotenv::dotenv;
use routes::create_router;
use service::{
    attachment_service::AttachmentService,
    file_storage::{ContentStore, DiskStore},
    ticket_service::TicketService,
    user_service::UserService,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<dyn HelpdeskDb>,
    pub ticket_service: TicketService,
    pub attachment_service: AttachmentService,
    pub user_service: UserService,
}

impl AppState {
    pub fn new(
        env: Config,
        db_client: Arc<dyn HelpdeskDb>,
        content_store: Arc<dyn ContentStore>,
    ) -> Self {
        let ticket_service = TicketService::new(db_client.clone());
        let attachment_service =
            AttachmentService::new(db_client.clone(), content_store, env.max_upload_bytes);
        let user_service = UserService::new(db_client.clone());

        AppState {
            env,
            db_client,
            ticket_service,
            attachment_service,
            user_service,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    dotenv().ok();

    let config = Config::init();

    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            println!("✅Connection to the database is successful!");
            pool
        }
        Err(err) => {
            println!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = sqlx::migrate!("./migrations").run(&pool).await {
        println!("🔥 Failed to run database migrations: {:?}", err);
        std::process::exit(1);
    }

    let content_store = match DiskStore::init(&config.upload_dir).await {
        Ok(store) => store,
        Err(err) => {
            println!("🔥 Failed to prepare upload directory {}: {:?}", config.upload_dir, err);
            std::process::exit(1);
        }
    };

    let allowed_origins = match config.frontend_origin.parse::<HeaderValue>() {
        Ok(origin) => vec![origin],
        Err(err) => {
            println!("🔥 Invalid FRONTEND_ORIGIN {}: {:?}", config.frontend_origin, err);
            std::process::exit(1);
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    let app_state = AppState::new(
        config.clone(),
        Arc::new(DBClient::new(pool)),
        Arc::new(content_store),
    );

    let app = create_router(Arc::new(app_state)).layer(cors);

    println!("🚀 Server is running on http://localhost:{}", config.port);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", &config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            println!("🔥 Failed to bind port {}: {:?}", config.port, err);
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", err);
    }
}
