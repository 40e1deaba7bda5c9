use std::path::Path;

use actix_web::{App, HttpServer, web};
use clap::Parser;
use sqlx::{Pool, Sqlite};
use tracing::{error, info};

use job_tracker::api::{health::health_config, job::handlers::job_config, validation};
use job_tracker::api::job::JobService;
use job_tracker::{config, db, logging};

mod cli;
mod shutdown;

use crate::cli::{Cli, Command};
use crate::shutdown::ShutdownCoordinator;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let Cli {
        database_url,
        log_dir,
        command,
    } = Cli::parse();

    // Load configuration from environment; command line flags win
    let mut config = config::Config::from_env().expect("Failed to load configuration");
    if let Some(database_url) = database_url {
        config.database_url = database_url;
    }
    if let Some(log_dir) = log_dir {
        config.log_dir = log_dir;
    }

    let command = command.unwrap_or(Command::Serve);
    let default_level = match command {
        Command::Serve => "info",
        _ => "warn",
    };
    logging::init(Path::new(&config.log_dir), default_level)?;

    let pool = db::connection::get_connection(&config.database_url)
        .await
        .expect("Failed to open database");
    info!("Database opened at {}", config.database_url);

    db::migrations::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let service = JobService::new(pool.clone());

    match command {
        Command::Serve => serve(config, pool, service).await,
        command => {
            let result = cli::run(command, &service).await;
            pool.close().await;
            if let Err(e) = result {
                error!("Command failed: {}", e);
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

async fn serve(config: config::Config, pool: Pool<Sqlite>, service: JobService) -> std::io::Result<()> {
    info!("Starting job-tracker server");
    info!("  - Max payload size: {} bytes", config.max_payload_size);

    let max_payload_size = config.max_payload_size;
    let server_pool = pool.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(server_pool.clone()))
            .app_data(web::Data::new(service.clone()))
            .app_data(web::PayloadConfig::default().limit(max_payload_size))
            .app_data(web::JsonConfig::default().limit(max_payload_size))
            .app_data(validation::json_config().limit(max_payload_size))
            .configure(health_config)
            .configure(job_config)
    })
    .disable_signals()
    .bind((config.host.as_str(), config.port))?
    .run();

    info!("Server listening on http://{}:{}", config.host, config.port);

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    ShutdownCoordinator::new(server_handle, server_task, pool)
        .wait_for_shutdown()
        .await
}
