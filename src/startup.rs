//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;

use crate::application::services::{MessageStore, MessageStoreImpl, RoomDirectory, RoomDirectoryImpl};
use crate::config::Settings;
use crate::domain::{
    FileStore, MessageRepository, ReadReceiptRepository, RoomRepository, TokenValidator,
    UserDirectory,
};
use crate::infrastructure::auth::JwtTokenValidator;
use crate::infrastructure::database::{self, MemoryDatabase};
use crate::infrastructure::repositories::memory::{
    InMemoryMessageRepository, InMemoryReadReceiptRepository, InMemoryRoomRepository,
    InMemoryUserDirectory,
};
use crate::infrastructure::repositories::{
    PgMessageRepository, PgReadReceiptRepository, PgRoomRepository, PgUserDirectory,
};
use crate::infrastructure::storage::LocalFileStore;
use crate::presentation::http::routes;
use crate::presentation::websocket::SignalingRelay;
use crate::shared::snowflake::SnowflakeGenerator;

/// Which backend holds rooms and messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Memory => "memory",
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<dyn RoomDirectory>,
    pub messages: Arc<dyn MessageStore>,
    pub users: Arc<dyn UserDirectory>,
    pub tokens: Arc<dyn TokenValidator>,
    pub relay: Arc<SignalingRelay>,
    pub settings: Arc<Settings>,
    pub storage: StorageKind,
    /// Present when running on PostgreSQL; used by the health check.
    pub db: Option<PgPool>,
}

impl AppState {
    /// State backed by the in-process database. Nothing outlives the process.
    pub fn in_memory(settings: Settings) -> Self {
        let db = Arc::new(MemoryDatabase::new());
        let users = Arc::new(InMemoryUserDirectory::new());

        Self::assemble(
            settings,
            Arc::new(InMemoryRoomRepository::new(db.clone())),
            Arc::new(InMemoryMessageRepository::new(db.clone())),
            Arc::new(InMemoryReadReceiptRepository::new(db)),
            users,
            StorageKind::Memory,
            None,
        )
    }

    /// State backed by PostgreSQL.
    pub fn postgres(settings: Settings, pool: PgPool) -> Self {
        Self::assemble(
            settings,
            Arc::new(PgRoomRepository::new(pool.clone())),
            Arc::new(PgMessageRepository::new(pool.clone())),
            Arc::new(PgReadReceiptRepository::new(pool.clone())),
            Arc::new(PgUserDirectory::new(pool.clone())),
            StorageKind::Postgres,
            Some(pool),
        )
    }

    fn assemble<R, M, Rd>(
        settings: Settings,
        room_repo: Arc<R>,
        message_repo: Arc<M>,
        read_repo: Arc<Rd>,
        users: Arc<dyn UserDirectory>,
        storage: StorageKind,
        db: Option<PgPool>,
    ) -> Self
    where
        R: RoomRepository + 'static,
        M: MessageRepository + 'static,
        Rd: ReadReceiptRepository + 'static,
    {
        let id_generator = Arc::new(SnowflakeGenerator::new(
            settings.snowflake.machine_id as u64,
            settings.snowflake.epoch,
        ));
        let files: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(
            &settings.uploads.directory,
            settings.uploads.public_prefix.clone(),
        ));

        let rooms = Arc::new(RoomDirectoryImpl::new(
            room_repo.clone(),
            users.clone(),
            files.clone(),
            id_generator.clone(),
            settings.invites.base_url.clone(),
        ));
        let messages = Arc::new(MessageStoreImpl::new(
            message_repo,
            room_repo,
            read_repo,
            users.clone(),
            files,
            id_generator,
        ));

        Self {
            rooms,
            messages,
            users,
            tokens: Arc::new(JwtTokenValidator::new(&settings.jwt.secret)),
            relay: Arc::new(SignalingRelay::new(settings.signaling.queue_capacity)),
            settings: Arc::new(settings),
            storage,
            db,
        }
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        let state = match settings.database.url.clone().filter(|_| settings.uses_database()) {
            Some(url) => {
                let pool = database::create_pool(&settings.database, &url)
                    .await
                    .context("failed to connect to PostgreSQL")?;
                tracing::info!("Database connection pool created");

                database::run_migrations(&pool)
                    .await
                    .context("failed to run migrations")?;
                tracing::info!("Database migrations applied");

                AppState::postgres(settings, pool)
            }
            None => {
                tracing::warn!("No database URL configured, using in-memory storage");
                AppState::in_memory(settings)
            }
        };

        tokio::fs::create_dir_all(&state.settings.uploads.directory)
            .await
            .with_context(|| format!("failed to create upload directory {}", state.settings.uploads.directory))?;

        let addr: SocketAddr = state
            .settings
            .server_addr()
            .parse()
            .context("invalid server address")?;

        let router = routes::create_router(state);

        // Bind to address
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
