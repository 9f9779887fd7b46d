use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use serde_json::Value;
use socketioxide::extract::{Data, SocketRef};
use socketioxide::SocketIo;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ResolvedConfig;
use crate::correlator::Correlator;
use crate::discovery::DiscoveryAdvertiser;
use crate::error::{Error, Result};
use crate::events::EventEmitter;
use crate::heartbeat;
use crate::registry::Registry;
use crate::router::{self, RouterState};

pub struct Server {
    config: ResolvedConfig,
}

impl Server {
    pub fn new(config: ResolvedConfig) -> Self {
        Server { config }
    }

    /// Bind → advertise → serve until signal → stop accepting → cancel
    /// background tasks → withdraw mDNS (§9 graceful shutdown recipe).
    pub async fn run(self) -> Result<()> {
        let registry = Arc::new(Registry::new());
        let (layer, io) = SocketIo::new_layer();
        let events = EventEmitter::new(io.clone(), self.config.room.clone());
        let ocr_timeout = if self.config.ocr_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.config.ocr_timeout_secs))
        };
        let correlator = Correlator::new(
            io.clone(),
            self.config.room.clone(),
            Arc::clone(&registry),
            events.clone(),
            ocr_timeout,
        );

        let router_state = RouterState {
            registry: Arc::clone(&registry),
            events: events.clone(),
            correlator,
            room: self.config.room.clone(),
        };
        io.ns("/", move |socket: SocketRef, Data(auth): Data<Value>| {
            router::register(socket, auth, router_state.clone());
        });

        let cors = self.build_cors();
        let app = axum::Router::new().layer(cors).layer(layer);

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|_| Error::InvalidAddress(self.config.host.clone(), self.config.port))?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Bind(addr, e))?;
        let bound_addr = listener.local_addr().map_err(|e| Error::Bind(addr, e))?;
        tracing::info!(%bound_addr, "relay-server listening");

        let discovery = DiscoveryAdvertiser::start(bound_addr.port(), Some(&self.config.mdns_service_type));

        events.server_started(&self.config.host, bound_addr.port());

        let heartbeat_handle = tokio::spawn(heartbeat::run(
            io.clone(),
            self.config.room.clone(),
            Arc::clone(&registry),
            Duration::from_secs(self.config.health_check_interval_secs),
        ));

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        heartbeat_handle.abort();
        if let Some(discovery) = discovery {
            discovery.stop().await;
        }
        tracing::info!("relay-server shut down gracefully");
        Ok(())
    }

    fn build_cors(&self) -> CorsLayer {
        if self.config.cors_origins.is_empty() {
            return CorsLayer::permissive();
        }
        let origins: Vec<HeaderValue> = self
            .config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
