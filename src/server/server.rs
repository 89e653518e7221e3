//! Embedding Server
//!
//! Owns the configuration and the single encoder instance, and runs the HTTP
//! server on top of them.

use std::future::Future;
use std::sync::Arc;
use tracing::info;

use crate::models::{load_encoder, EmbeddingResult, SentenceEncoder};
use crate::server::config::ServerConfig;
use crate::server::hyper_server::start_hyper_http_server;

pub struct EmbeddingServer {
    config: Arc<ServerConfig>,
    encoder: Arc<dyn SentenceEncoder>,
}

impl EmbeddingServer {
    /// Validate the configuration and load the encoder
    pub fn new(config: ServerConfig) -> EmbeddingResult<Self> {
        info!("🚀 Initializing Embedding Server");
        config.validate()?;

        info!("📦 Loading model {}", config.model.name);
        let encoder = load_encoder(&config.model)?;
        info!(
            "✅ Model loaded ({} dimensions)",
            encoder.dimension()
        );

        Ok(Self::with_encoder(config, encoder))
    }

    /// Build a server around an already constructed encoder
    pub fn with_encoder(config: ServerConfig, encoder: Arc<dyn SentenceEncoder>) -> Self {
        Self {
            config: Arc::new(config),
            encoder,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn encoder(&self) -> Arc<dyn SentenceEncoder> {
        Arc::clone(&self.encoder)
    }

    /// Serve until Ctrl+C
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.start_with_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("🛑 Shutdown signal received");
            }
        })
        .await
    }

    /// Serve until `shutdown` resolves
    pub async fn start_with_shutdown<F>(&self, shutdown: F) -> Result<(), Box<dyn std::error::Error>>
    where
        F: Future<Output = ()>,
    {
        start_hyper_http_server(Arc::clone(&self.config), self.encoder(), shutdown).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::model::testing::FakeEncoder;

    #[test]
    fn test_with_encoder() {
        let server = EmbeddingServer::with_encoder(
            ServerConfig::default(),
            Arc::new(FakeEncoder::new(384)),
        );

        assert_eq!(server.encoder().dimension(), 384);
        assert_eq!(server.config().network.bind_address, "0.0.0.0:7860");
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = ServerConfig::default();
        config.network.bind_address = "nowhere".to_string();
        assert!(EmbeddingServer::new(config).is_err());
    }

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let mut config = ServerConfig::default();
        config.network.bind_address = "127.0.0.1:0".to_string();
        let server = EmbeddingServer::with_encoder(config, Arc::new(FakeEncoder::new(384)));

        // Resolves immediately, so the server binds and then drains
        let result = server.start_with_shutdown(async {}).await;
        assert!(result.is_ok());
    }
}
