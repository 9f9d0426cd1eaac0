use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use rfpgen_core::Orchestrator;
use rfpgen_core::config::GatewayConfig;
use rfpgen_llm::AnyProvider;
use tokio::sync::watch;

use crate::error::GatewayError;
use crate::router::build_router;

#[derive(Clone)]
pub(crate) struct AppState {
    pub orchestrator: Arc<Orchestrator<AnyProvider>>,
    pub started_at: Instant,
}

/// HTTP front end for the proposal pipeline.
pub struct GatewayServer {
    addr: SocketAddr,
    auth_token: Option<String>,
    rate_limit: u32,
    max_body_size: usize,
    orchestrator: Arc<Orchestrator<AnyProvider>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl GatewayServer {
    /// Build a server from the `[gateway]` config section. An unparsable bind
    /// address falls back to `127.0.0.1`.
    #[must_use]
    pub fn from_config(
        config: &GatewayConfig,
        auth_token: Option<String>,
        orchestrator: Arc<Orchestrator<AnyProvider>>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let GatewayConfig {
            bind,
            port,
            rate_limit,
            max_body_size,
        } = config;
        let addr = match format!("{bind}:{port}").parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(e) => {
                tracing::warn!(%bind, "invalid gateway bind address ({e}), using 127.0.0.1");
                SocketAddr::from(([127, 0, 0, 1], *port))
            }
        };
        if addr.ip().is_unspecified() {
            tracing::warn!(%addr, "gateway listens on all interfaces");
        }

        Self {
            addr,
            auth_token,
            rate_limit: *rate_limit,
            max_body_size: *max_body_size,
            orchestrator,
            shutdown_rx,
        }
    }

    /// Serve until the shutdown flag flips to `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind or the server hits a fatal I/O error.
    pub async fn serve(self) -> Result<(), GatewayError> {
        if self.auth_token.is_none() {
            tracing::warn!("RFPGEN_GATEWAY_TOKEN is not set, upload routes are unauthenticated");
        }

        let state = AppState {
            orchestrator: self.orchestrator,
            started_at: Instant::now(),
        };
        let router = build_router(state, self.auth_token, self.rate_limit, self.max_body_size);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| GatewayError::Bind(self.addr.to_string(), e))?;
        tracing::info!("gateway listening on {}", self.addr);

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            while !*shutdown_rx.borrow_and_update() {
                if shutdown_rx.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
            tracing::info!("gateway shutting down");
        })
        .await
        .map_err(|e| GatewayError::Server(format!("{e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    fn gateway(bind: &str, port: u16) -> GatewayConfig {
        GatewayConfig {
            bind: bind.into(),
            port,
            ..GatewayConfig::default()
        }
    }

    #[test]
    fn from_config_copies_limits() {
        let fixture = Fixture::new(Vec::new());
        let (_stx, srx) = watch::channel(false);
        let config = GatewayConfig {
            rate_limit: 60,
            max_body_size: 512,
            ..gateway("127.0.0.1", 8090)
        };
        let server = GatewayServer::from_config(
            &config,
            Some("token".into()),
            fixture.state().orchestrator,
            srx,
        );

        assert_eq!(server.rate_limit, 60);
        assert_eq!(server.max_body_size, 512);
        assert!(server.auth_token.is_some());
        assert_eq!(server.addr.port(), 8090);
    }

    #[test]
    fn invalid_bind_falls_back_to_loopback() {
        let fixture = Fixture::new(Vec::new());
        let (_stx, srx) = watch::channel(false);
        let server = GatewayServer::from_config(
            &gateway("not_an_ip", 9999),
            None,
            fixture.state().orchestrator,
            srx,
        );
        assert_eq!(server.addr.ip().to_string(), "127.0.0.1");
        assert_eq!(server.addr.port(), 9999);
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown_signal() {
        let fixture = Fixture::new(Vec::new());
        let (stx, srx) = watch::channel(false);
        let server = GatewayServer::from_config(
            &gateway("127.0.0.1", 0),
            None,
            fixture.state().orchestrator,
            srx,
        );
        let handle = tokio::spawn(server.serve());
        stx.send(true).unwrap();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
