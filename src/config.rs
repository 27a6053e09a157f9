use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::types::InAppNotification;

/// Page size used when a fetch call does not specify one.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Forced lifetime of a single push channel connection. Intermediaries
/// (idle timeouts, load balancers) tend to kill sockets that live much
/// longer, so the channel is cycled before they get the chance.
pub const DEFAULT_SOCKET_LIFETIME: Duration = Duration::from_secs(9 * 60);

const DEFAULT_OLDEST_WINDOW_DAYS: i64 = 30;

/// Callback invoked with every batch of notifications pushed over the live
/// channel. Delivery is fire-and-forget; a panic inside the handler is not
/// caught by the channel supervisor.
pub type NewNotificationHandler = Arc<dyn Fn(Vec<InAppNotification>) + Send + Sync>;

/// Hosted regions with preset API and socket hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    UnitedStates,
    Europe,
}

impl Region {
    pub fn api_host(self) -> &'static str {
        match self {
            Region::UnitedStates => "api.notificationapi.com",
            Region::Europe => "api.eu.notificationapi.com",
        }
    }

    pub fn socket_host(self) -> &'static str {
        match self {
            Region::UnitedStates => "ws.notificationapi.com",
            Region::Europe => "ws.eu.notificationapi.com",
        }
    }
}

/// Merged runtime configuration for one end-user session.
///
/// Immutable after construction; build a new value to change anything.
/// Every component receives the configuration explicitly, so multiple
/// sessions in one process stay independent.
#[derive(Clone)]
pub struct ClientConfig {
    pub client_id: String,
    pub user_id: String,
    pub user_id_hash: Option<String>,
    pub api_host: String,
    pub socket_host: String,
    pub default_page_size: usize,
    /// RFC 3339 timestamp; history older than this is not requested unless
    /// a fetch call overrides it.
    pub default_oldest: String,
    pub socket_lifetime: Duration,
    pub on_new_notifications: Option<NewNotificationHandler>,
}

impl ClientConfig {
    pub fn builder(
        client_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> ClientConfigBuilder {
        ClientConfigBuilder {
            client_id: client_id.into(),
            user_id: user_id.into(),
            user_id_hash: None,
            region: Region::UnitedStates,
            api_host: None,
            socket_host: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            default_oldest: None,
            socket_lifetime: DEFAULT_SOCKET_LIFETIME,
            on_new_notifications: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("user_id", &self.user_id)
            .field("user_id_hash", &self.user_id_hash)
            .field("api_host", &self.api_host)
            .field("socket_host", &self.socket_host)
            .field("default_page_size", &self.default_page_size)
            .field("default_oldest", &self.default_oldest)
            .field("socket_lifetime", &self.socket_lifetime)
            .field(
                "on_new_notifications",
                &self.on_new_notifications.as_ref().map(|_| "<handler>"),
            )
            .finish()
    }
}

/// Builder for [`ClientConfig`]. Region presets fill the hosts; explicit
/// host overrides win over the preset.
pub struct ClientConfigBuilder {
    client_id: String,
    user_id: String,
    user_id_hash: Option<String>,
    region: Region,
    api_host: Option<String>,
    socket_host: Option<String>,
    default_page_size: usize,
    default_oldest: Option<String>,
    socket_lifetime: Duration,
    on_new_notifications: Option<NewNotificationHandler>,
}

impl ClientConfigBuilder {
    /// Integrity hash computed by the caller's backend, proving the userId
    /// was not spoofed client-side.
    pub fn user_id_hash(mut self, hash: impl Into<String>) -> Self {
        self.user_id_hash = Some(hash.into());
        self
    }

    pub fn region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    pub fn api_host(mut self, host: impl Into<String>) -> Self {
        self.api_host = Some(host.into());
        self
    }

    pub fn socket_host(mut self, host: impl Into<String>) -> Self {
        self.socket_host = Some(host.into());
        self
    }

    pub fn default_page_size(mut self, count: usize) -> Self {
        self.default_page_size = count;
        self
    }

    /// RFC 3339 cutoff used when a fetch call does not supply one.
    pub fn default_oldest(mut self, oldest: impl Into<String>) -> Self {
        self.default_oldest = Some(oldest.into());
        self
    }

    pub fn socket_lifetime(mut self, lifetime: Duration) -> Self {
        self.socket_lifetime = lifetime;
        self
    }

    pub fn on_new_notifications<F>(mut self, handler: F) -> Self
    where
        F: Fn(Vec<InAppNotification>) + Send + Sync + 'static,
    {
        self.on_new_notifications = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> ClientConfig {
        let default_oldest = self.default_oldest.unwrap_or_else(|| {
            format_rfc3339(
                OffsetDateTime::now_utc() - time::Duration::days(DEFAULT_OLDEST_WINDOW_DAYS),
            )
        });
        ClientConfig {
            client_id: self.client_id,
            user_id: self.user_id,
            user_id_hash: self.user_id_hash,
            api_host: self
                .api_host
                .unwrap_or_else(|| self.region.api_host().to_string()),
            socket_host: self
                .socket_host
                .unwrap_or_else(|| self.region.socket_host().to_string()),
            default_page_size: self.default_page_size,
            default_oldest,
            socket_lifetime: self.socket_lifetime,
            on_new_notifications: self.on_new_notifications,
        }
    }
}

/// Whether a configured host names the local machine. Compares the
/// authority's host part exactly, so `mylocalhost.example.com` does not
/// qualify. In-process test fixtures rely on this to get plain-text
/// schemes.
pub(crate) fn is_local_host(host: &str) -> bool {
    let name = host.split_once(':').map(|(name, _)| name).unwrap_or(host);
    name == "127.0.0.1" || name == "localhost"
}

pub(crate) fn format_rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_default()
}

pub(crate) fn now_rfc3339() -> String {
    format_rfc3339(OffsetDateTime::now_utc())
}
