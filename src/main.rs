use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use chirp::config::Config;
use chirp::db::Db;
use chirp::routes;
use env_logger::Env;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Init logger to show info by default, but can be overridden by RUST_LOG
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cfg = Config::from_env_config();

    let db = Db::connect_and_migrate(&cfg.database_path)
        .await
        .expect("database init failed");

    log::info!("Starting server at {}", cfg.listen);

    let listen_addr = cfg.listen.clone();
    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CONTENT_TYPE,
            ])
            .max_age(3600);
        for origin in &cfg.allowed_origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(Data::new(cfg.clone()))
            .app_data(Data::new(db.clone()))
            .configure(routes::configure)
    })
    .bind(listen_addr)?
    .run()
    .await
}
