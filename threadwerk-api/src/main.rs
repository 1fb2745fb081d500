use serde::Deserialize;
use server::ServerState;
use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::Arc,
};
use thiserror::Error;
use threadwerk_common::snowflake::{ProcessId, SnowflakePartOutOfRangeError, WorkerId};
use threadwerk_store::{
    clock::SystemClock,
    comments::CommentStore,
    id::SnowflakeIdAllocator,
    object::{FsObjectStore, GzipObjectStore},
    post::StaticPostStore,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod server;

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Snowflake part out of range: {0}")]
    SnowflakePart(#[from] SnowflakePartOutOfRangeError<u8>),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

fn default_storage_bucket() -> String {
    "comments".to_owned()
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Env {
    server_address: IpAddr,
    server_port: u16,
    storage_root: PathBuf,
    #[serde(default = "default_storage_bucket")]
    storage_bucket: String,
    #[serde(default)]
    storage_prefix: String,
    #[serde(default)]
    worker_id: u8,
    #[serde(default)]
    process_id: u8,
    #[serde(default)]
    known_posts: Vec<String>,
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "threadwerk_api=debug,\
                threadwerk_store=debug,\
                tower_http=debug,axum::rejection=trace"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "Could not listen for ctrl-c, serving until killed");
        std::future::pending::<()>().await;
    }

    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;

    let ids = SnowflakeIdAllocator::new(
        WorkerId::try_from(env.worker_id)?,
        ProcessId::try_from(env.process_id)?,
    );
    let posts: StaticPostStore = env.known_posts.into_iter().collect();
    let comments = CommentStore::new(
        GzipObjectStore::new(FsObjectStore::new(env.storage_root)),
        posts,
        ids,
        SystemClock,
        env.storage_bucket,
    )
    .with_prefix(&env.storage_prefix);

    let tracing_layer = TraceLayer::new_for_http();
    let app = server::routes()
        .with_state(ServerState {
            comments: Arc::new(comments),
        })
        .layer(tracing_layer);

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}
