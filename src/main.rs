use std::env;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};

use tienda_api::store::{PgStore, ProductStore};
use tienda_api::{db, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok(); // Load environment variables from .env file
    env_logger::init(); // Initialize the logger

    // Connect to Postgres and bring the schema up to date
    let pool = db::connect().await;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let store: Arc<dyn ProductStore> = Arc::new(PgStore::new(pool));
    let store = web::Data::from(store);

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    log::info!("listening on {}", bind_addr);

    // Start the Actix-web HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(store.clone()) // Share the store with handlers
            .configure(handlers::configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}
