//! Asynchronous client SDK for the hosted in-app notification service.
//!
//! Responsibilities:
//! - authenticating a single end-user session against the REST surface
//! - fetching and paginating notification history with deduplication and
//!   a time-window stop condition
//! - mutating notification state and delivery preferences
//! - keeping a live push channel open, with each connection's lifetime
//!   bounded by a forced reconnect cycle
//!
//! One [`ClientConfig`] value describes one session; every component
//! receives it explicitly, so multiple sessions coexist in a process.
//!
//! ```no_run
//! use inapp_sdk::{ClientConfig, NotificationClient};
//!
//! # async fn demo() -> inapp_sdk::Result<()> {
//! let config = ClientConfig::builder("24nojpnrsdc53fkslha0roov05", "sahand")
//!     .on_new_notifications(|batch| println!("{} new notifications", batch.len()))
//!     .build();
//! let client = NotificationClient::new(config);
//!
//! let feed = client
//!     .get_in_app_notifications("2024-06-01T00:00:00.000Z", Some(1000), None)
//!     .await?;
//! println!("{} notifications", feed.items.len());
//!
//! client.connect(); // live push channel
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod socket;
pub mod types;

pub use api::{ApiClient, ApiObserver};
pub use client::{InAppUpdate, NotificationClient};
pub use config::{ClientConfig, ClientConfigBuilder, NewNotificationHandler, Region};
pub use error::{Error, Result};
pub use feed::{FeedPage, PageSource};
pub use socket::PushChannel;
pub use types::{
    AccountMetadata, Channel, Delivery, InAppNotification, Preferences, PreferenceUpdate,
    UserProfile,
};
