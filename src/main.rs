use args::Args;
use clap::Parser;
use log::{LevelFilter, error, info};
use russh::keys::ssh_key::rand_core::OsRng;
use russh::server::Server as _;
use server::{Server, ServerConfig};
use std::sync::Arc;
use std::time::Duration;

mod args;
mod server;
mod sftp;
mod ssh_session;

#[tokio::main]
async fn main() {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();

    // The sandbox root must exist before we accept clients; everything a
    // client can reach is resolved underneath it.
    if !args.root_dir.exists() {
        if let Err(e) = std::fs::create_dir_all(&args.root_dir) {
            error!("Failed to create root directory {:?}: {}", args.root_dir, e);
            std::process::exit(1);
        }
    }

    if !args.root_dir.is_dir() {
        error!("Root directory {:?} is not a directory", args.root_dir);
        std::process::exit(1);
    }

    let root_dir = match args.root_dir.canonicalize() {
        Ok(path) => path,
        Err(e) => {
            error!(
                "Failed to canonicalize root directory {:?}: {}",
                args.root_dir, e
            );
            std::process::exit(1);
        }
    };

    info!("SFTP root directory: {:?}", root_dir);
    info!("Max read buffer size: {} bytes", args.max_read_size);

    let server_config = Arc::new(ServerConfig {
        username: args.username,
        password: args.password,
        root_dir,
        max_read_size: args.max_read_size,
    });

    let config = russh::server::Config {
        auth_rejection_time: Duration::from_secs(3),
        auth_rejection_time_initial: Some(Duration::from_secs(0)),
        keys: vec![
            russh::keys::PrivateKey::random(&mut OsRng, russh::keys::Algorithm::Ed25519).unwrap(),
        ],
        ..Default::default()
    };

    let mut server = Server {
        config: server_config,
    };

    info!("Starting SFTP server on {}:{}", args.host, args.port);
    info!(
        "Use credentials: username='{}', password='***'",
        server.config.username
    );

    if let Err(e) = server
        .run_on_address(Arc::new(config), (args.host.as_str(), args.port))
        .await
    {
        error!("Server terminated: {}", e);
        std::process::exit(1);
    }
}
