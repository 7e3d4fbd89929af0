//! Health check handler

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    timestamp: String,
}

/// Handle bakemate.ping messages; any payload is accepted
pub async fn handle_ping(client: Client, mut subscriber: Subscriber, pool: PgPool) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received ping message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Ping message without reply subject");
                continue;
            }
        };

        let database = match sqlx::query("SELECT 1").execute(&pool).await {
            Ok(_) => "up",
            Err(e) => {
                warn!("Database health check failed: {}", e);
                "down"
            }
        };

        let response = HealthResponse {
            status: if database == "up" { "ok" } else { "degraded" },
            database,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        client.publish(reply, serde_json::to_vec(&response)?.into()).await?;
    }

    Ok(())
}
