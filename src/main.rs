use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpServer};
use log::info;

use teamflow::{auth, routes, store::PgStore, AppState, Config};

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{context}: {err}"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| startup_error("invalid configuration", e))?;
    // first unknown-user login would otherwise also pay for building this
    auth::dummy_hash(config.bcrypt_cost).map_err(|e| startup_error("bcrypt unavailable", e))?;

    let store = PgStore::connect(&config.database_url)
        .await
        .map_err(|e| startup_error("failed to connect to database", e))?;
    store
        .migrate()
        .await
        .map_err(|e| startup_error("failed to run migrations", e))?;

    let bind = (config.server_host.clone(), config.server_port);
    let origins = config.allowed_origins.clone();
    info!("Starting server at {}", config.server_url());

    let state = web::Data::new(AppState::new(Arc::new(store), config));

    HttpServer::new(move || {
        let cors = origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allow_any_method()
            .allow_any_header()
            .expose_headers([header::WWW_AUTHENTICATE])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(middleware::NormalizePath::trim())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
    })
    .bind(bind)?
    .run()
    .await
}
