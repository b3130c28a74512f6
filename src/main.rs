use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use ballotbox::config::Config;
use ballotbox::database::sqlx::{migrate, PgSqlxManager};
use ballotbox::handlers;
use log::info;
use sqlx::postgres::PgPoolOptions;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info,actix_web=info")).init();
    let config = Config::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    if config.run_migrations {
        migrate(&pool).await?;
        info!("migrations applied");
    }
    let manager = Data::new(PgSqlxManager::new(pool));
    info!("listening on {}", config.bind_addr);
    HttpServer::new(move || App::new().wrap(Logger::default()).app_data(manager.clone()).configure(handlers::routes))
        .bind(&config.bind_addr)?
        .run()
        .await?;
    Ok(())
}
