//! Wire types for the notification service REST and socket surfaces.
//!
//! Field names follow the service's camelCase JSON. Optional fields are
//! lenient on input (`#[serde(default)]`) and omitted on output so request
//! bodies stay minimal.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One in-app notification record.
///
/// `id` is the deduplication key; `date` is the ordering key. Dates are
/// fixed-width, zero-padded UTC ISO-8601, so lexicographic comparison is
/// chronological comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InAppNotification {
    pub id: String,
    pub notification_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_notification_id: Option<String>,
    #[serde(default)]
    pub seen: bool,
    pub title: String,
    #[serde(default, rename = "redirectURL", skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(default, rename = "imageURL", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub date: String,
    /// Snapshot of the delivery configuration that produced this record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_options: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<InAppTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(default, rename = "expDate", skip_serializing_if = "Option::is_none")]
    pub exp_date: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opened: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clicked: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actioned1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actioned2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<NotificationReply>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationReply {
    pub date: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InAppTemplate {
    pub instant: TemplateVariant,
    pub batch: TemplateVariant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateVariant {
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "redirectURL")]
    pub redirect_url: String,
    #[serde(default, rename = "imageURL")]
    pub image_url: String,
}

/// GET `notifications/INAPP_WEB` response envelope.
#[derive(Debug, Default, Deserialize)]
pub struct NotificationsPage {
    #[serde(default)]
    pub notifications: Vec<InAppNotification>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    Email,
    InappWeb,
    Sms,
    Call,
    Push,
    WebPush,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    Off,
    Instant,
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

/// One preference tuple, both as read from and as POSTed verbatim to
/// `preferences`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceUpdate {
    pub notification_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_notification_id: Option<String>,
    pub channel: Channel,
    pub delivery: Delivery,
}

/// GET `preferences` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub preferences: Vec<PreferenceUpdate>,
    #[serde(default)]
    pub notifications: Vec<PreferenceTopic>,
    #[serde(default)]
    pub sub_notifications: Vec<SubNotificationTopic>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceTopic {
    pub notification_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub options: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubNotificationTopic {
    pub notification_id: String,
    pub sub_notification_id: String,
    #[serde(default)]
    pub title: String,
}

/// Identity-upsert body. An explicit `id` must match the session's
/// configured userId; see [`crate::client::NotificationClient::identify`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_tokens: Option<Vec<PushToken>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_push_tokens: Option<Vec<WebPushToken>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushToken {
    #[serde(rename = "type")]
    pub provider: PushProvider,
    pub token: String,
    pub device: Device,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PushProvider {
    Fcm,
    Apn,
}

/// Wire names on this one are snake_case, unlike the rest of the surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Device {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_id: Option<String>,
    pub device_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebPushToken {
    pub sub: WebPushSubscription,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebPushSubscription {
    pub endpoint: String,
    pub keys: WebPushKeys,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebPushKeys {
    pub p256dh: String,
    pub auth: String,
}

/// GET `account_metadata` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMetadata {
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub environment_vapid_public_key: String,
    #[serde(default)]
    pub has_web_push_enabled: bool,
}

/// Route discriminator for inbound socket frames that carry freshly
/// delivered notifications.
pub const ROUTE_NEW_NOTIFICATIONS: &str = "inapp_web/new_notifications";

/// Payload of a `inapp_web/new_notifications` frame.
#[derive(Debug, Default, Deserialize)]
pub struct NewNotificationsPayload {
    #[serde(default)]
    pub notifications: Vec<InAppNotification>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_record_round_trips_camel_case() {
        let raw = serde_json::json!({
            "id": "t-1",
            "notificationId": "welcome",
            "subNotificationId": "team-a",
            "seen": true,
            "title": "Welcome!",
            "redirectURL": "https://example.com/home",
            "date": "2023-01-02T00:00:00.000Z",
            "expDate": 1700000000u64,
            "actioned1": "2023-01-04T00:00:00.000Z",
            "replies": [{"date": "2023-01-03T00:00:00.000Z", "message": "hi"}]
        });
        let record: InAppNotification = serde_json::from_value(raw).expect("decodes");
        assert_eq!(record.notification_id, "welcome");
        assert_eq!(record.sub_notification_id.as_deref(), Some("team-a"));
        assert_eq!(record.redirect_url.as_deref(), Some("https://example.com/home"));
        assert_eq!(record.exp_date, Some(1700000000));
        assert_eq!(record.actioned1.as_deref(), Some("2023-01-04T00:00:00.000Z"));

        let back = serde_json::to_value(&record).expect("encodes");
        assert_eq!(back["notificationId"], "welcome");
        assert_eq!(back["redirectURL"], "https://example.com/home");
        assert_eq!(back["actioned1"], "2023-01-04T00:00:00.000Z");
        assert!(back.get("imageURL").is_none(), "absent optionals stay absent");
        assert!(back.get("actioned2").is_none(), "absent optionals stay absent");
    }

    #[test]
    fn channel_and_delivery_use_service_spelling() {
        assert_eq!(
            serde_json::to_value(Channel::InappWeb).unwrap(),
            serde_json::json!("INAPP_WEB")
        );
        assert_eq!(
            serde_json::to_value(Channel::WebPush).unwrap(),
            serde_json::json!("WEB_PUSH")
        );
        assert_eq!(
            serde_json::to_value(Delivery::Instant).unwrap(),
            serde_json::json!("instant")
        );
    }

    #[test]
    fn preference_update_omits_absent_sub_notification() {
        let update = PreferenceUpdate {
            notification_id: "20240530".into(),
            sub_notification_id: None,
            channel: Channel::InappWeb,
            delivery: Delivery::Off,
        };
        let body = serde_json::to_value(&update).unwrap();
        assert_eq!(body["notificationId"], "20240530");
        assert!(body.get("subNotificationId").is_none());
    }

    #[test]
    fn preferences_response_tolerates_missing_sections() {
        let prefs: Preferences = serde_json::from_value(serde_json::json!({
            "preferences": [
                {"notificationId": "n", "channel": "EMAIL", "delivery": "weekly"}
            ]
        }))
        .expect("decodes");
        assert_eq!(prefs.preferences.len(), 1);
        assert_eq!(prefs.preferences[0].channel, Channel::Email);
        assert_eq!(prefs.preferences[0].delivery, Delivery::Weekly);
        assert!(prefs.notifications.is_empty());
        assert!(prefs.sub_notifications.is_empty());
    }

    #[test]
    fn push_token_uses_type_key_for_provider() {
        let token = PushToken {
            provider: PushProvider::Fcm,
            token: "tok".into(),
            device: Device {
                device_id: "dev-1".into(),
                ..Device::default()
            },
        };
        let body = serde_json::to_value(&token).unwrap();
        assert_eq!(body["type"], "FCM");
        assert_eq!(body["device"]["device_id"], "dev-1");
    }
}
