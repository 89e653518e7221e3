//! Embedding Server Main
//!
//! Entry point for the sentence embedding HTTP server

use minilm_embedding_server::{EmbeddingServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration, built-in defaults when config.toml is absent
    let config = ServerConfig::from_file_or_default("config.toml")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .without_time()
        .init();

    println!("🚀 Sentence Embedding Server");
    println!("📊 Log Level: {}", config.monitoring.log_level);
    println!("===============================");

    // The encoder is loaded exactly once, here
    let server = EmbeddingServer::new(config)?;

    println!("✅ Model loaded, serving on {}", server.config().network.bind_address);
    println!("🛑 Press Ctrl+C to stop");

    server.start().await?;

    Ok(())
}
