use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use uuid::Uuid;

use crate::config::WebhookConfig;
use crate::entity::release;

/// Release fields included in webhook payloads.
#[derive(Serialize, Clone)]
pub struct ReleaseSummary {
    pub id: Uuid,
    pub platform: String,
    pub channel: String,
    pub runtime_version: String,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_from_id: Option<Uuid>,
}

impl From<&release::Model> for ReleaseSummary {
    fn from(model: &release::Model) -> Self {
        Self {
            id: model.id,
            platform: model.platform.clone(),
            channel: model.channel.clone(),
            runtime_version: model.runtime_version.clone(),
            message: model.message.clone(),
            rollback_from_id: model.rollback_from_id,
        }
    }
}

#[derive(Serialize)]
struct WebhookPayload {
    event: &'static str,
    release: ReleaseSummary,
    timestamp: chrono::DateTime<Utc>,
}

/// Posts release lifecycle notifications to a configured endpoint.
///
/// Delivery is fire-and-forget: failures are logged and never affect the
/// request that triggered the notification.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: Option<String>,
    secret: Option<String>,
}

impl WebhookNotifier {
    pub fn new(config: &WebhookConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.on_release_url.clone(),
            secret: config.secret.clone(),
        }
    }

    pub fn notify(&self, event: &'static str, summary: ReleaseSummary) {
        let Some(url) = self.url.clone() else {
            return;
        };
        let client = self.client.clone();
        let secret = self.secret.clone();
        tokio::spawn(async move {
            if let Err(e) = deliver(&client, &url, secret.as_deref(), event, summary).await {
                tracing::warn!(event, error = %e, "webhook delivery failed");
            }
        });
    }
}

async fn deliver(
    client: &reqwest::Client,
    url: &str,
    secret: Option<&str>,
    event: &'static str,
    release: ReleaseSummary,
) -> anyhow::Result<()> {
    let payload = WebhookPayload {
        event,
        release,
        timestamp: Utc::now(),
    };
    let body = serde_json::to_vec(&payload)?;

    let mut request = client
        .post(url)
        .header("content-type", "application/json")
        .body(body.clone());
    if let Some(secret) = secret {
        request = request.header("x-webhook-signature", signature(secret, &body));
    }

    request.send().await?.error_for_status()?;
    Ok(())
}

fn signature(secret: &str, body: &[u8]) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}
