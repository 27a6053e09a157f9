//! High-level client: one value per end-user session, tying the
//! authenticated transport, the pagination engine, and the push channel
//! together.

use std::slice;
use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};

use crate::api::{ApiClient, ApiObserver};
use crate::config::{now_rfc3339, ClientConfig};
use crate::error::{Error, Result};
use crate::feed::{self, FeedPage};
use crate::socket::PushChannel;
use crate::types::{AccountMetadata, Preferences, PreferenceUpdate, UserProfile};

/// Tri-state flags for a notification-state mutation.
///
/// `Some(true)` stamps the field with the current time, `Some(false)`
/// clears it to null, `None` omits the key so the field is untouched.
/// Callers must preserve the absent/false distinction.
#[derive(Debug, Clone, Default)]
pub struct InAppUpdate {
    pub ids: Vec<String>,
    pub opened: Option<bool>,
    pub clicked: Option<bool>,
    pub archived: Option<bool>,
}

impl InAppUpdate {
    pub fn new(ids: Vec<String>) -> Self {
        Self {
            ids,
            ..Self::default()
        }
    }

    pub fn opened(mut self, opened: bool) -> Self {
        self.opened = Some(opened);
        self
    }

    pub fn clicked(mut self, clicked: bool) -> Self {
        self.clicked = Some(clicked);
        self
    }

    pub fn archived(mut self, archived: bool) -> Self {
        self.archived = Some(archived);
        self
    }
}

/// PATCH body for `notifications/INAPP_WEB`.
fn tracking_body(update: &InAppUpdate, now: &str) -> Value {
    let mut body = serde_json::Map::new();
    body.insert("trackingIds".into(), json!(update.ids));
    for (key, flag) in [
        ("opened", update.opened),
        ("clicked", update.clicked),
        ("archived", update.archived),
    ] {
        match flag {
            Some(true) => {
                body.insert(key.into(), json!(now));
            }
            Some(false) => {
                body.insert(key.into(), Value::Null);
            }
            None => {}
        }
    }
    Value::Object(body)
}

pub struct NotificationClient {
    config: Arc<ClientConfig>,
    api: ApiClient,
    channel: PushChannel,
}

impl NotificationClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_observer(config, None)
    }

    pub fn with_observer(config: ClientConfig, observer: Option<Arc<dyn ApiObserver>>) -> Self {
        let config = Arc::new(config);
        Self {
            api: ApiClient::with_observer(config.clone(), observer),
            channel: PushChannel::new(config.clone()),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Collects notifications older than `before`, newest request first,
    /// until the configured limits hit. `max_count` and `oldest` fall back
    /// to the session defaults.
    pub async fn get_in_app_notifications(
        &self,
        before: &str,
        max_count: Option<usize>,
        oldest: Option<&str>,
    ) -> Result<FeedPage> {
        let max_count = max_count.unwrap_or(self.config.default_page_size);
        let oldest = oldest.unwrap_or(&self.config.default_oldest);
        feed::collect_older_than(&self.api, before, max_count, oldest).await
    }

    /// Applies tri-state opened/clicked/archived flags to a set of
    /// notifications.
    pub async fn update_in_app_notifications(&self, update: &InAppUpdate) -> Result<Option<Value>> {
        let body = tracking_body(update, &now_rfc3339());
        self.api
            .request(Method::PATCH, "notifications/INAPP_WEB", Some(&body))
            .await
    }

    /// Full preference set for the session user.
    pub async fn get_preferences(&self) -> Result<Option<Preferences>> {
        self.api.request_typed(Method::GET, "preferences", None).await
    }

    /// Sends preference tuples verbatim.
    pub async fn post_preferences(&self, updates: &[PreferenceUpdate]) -> Result<Option<Value>> {
        let body = serde_json::to_value(updates)?;
        self.api
            .request(Method::POST, "preferences", Some(&body))
            .await
    }

    pub async fn update_delivery_option(&self, update: &PreferenceUpdate) -> Result<Option<Value>> {
        self.post_preferences(slice::from_ref(update)).await
    }

    /// Upserts the session user's profile.
    ///
    /// An explicit `id` differing from the configured userId fails before
    /// any network call; silently writing another account is the one
    /// mistake this API refuses to make easy.
    pub async fn identify(&self, profile: &UserProfile) -> Result<Option<Value>> {
        if let Some(id) = &profile.id {
            if id != &self.config.user_id {
                return Err(Error::IdentityMismatch {
                    expected: self.config.user_id.clone(),
                    provided: id.clone(),
                });
            }
        }
        let body = serde_json::to_value(profile)?;
        self.api.request(Method::POST, "", Some(&body)).await
    }

    pub async fn get_account_metadata(&self) -> Result<Option<AccountMetadata>> {
        self.api
            .request_typed(Method::GET, "account_metadata", None)
            .await
    }

    /// Channels available on a provider integration (e.g. a chat
    /// workspace linked to the environment).
    pub async fn get_provider_channels(&self, provider: &str) -> Result<Option<Value>> {
        let resource = format!("integrations/{}/channels", urlencoding::encode(provider));
        self.api.request(Method::GET, &resource, None).await
    }

    pub async fn link_provider_channel(
        &self,
        provider: &str,
        channel_id: &str,
    ) -> Result<Option<Value>> {
        let resource = format!("integrations/{}/channels", urlencoding::encode(provider));
        let body = json!({ "channelId": channel_id });
        self.api.request(Method::POST, &resource, Some(&body)).await
    }

    /// Opens the live push channel; returns immediately. An open channel
    /// is cycled, never duplicated.
    pub fn connect(&self) {
        self.channel.connect();
    }

    /// Closes the live push channel and cancels its pending reconnect.
    pub fn disconnect(&self) {
        self.channel.disconnect();
    }

    pub fn channel(&self) -> &PushChannel {
        &self.channel
    }
}
