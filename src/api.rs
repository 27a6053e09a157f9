//! Authenticated transport against the service's REST surface.
//!
//! One request per call, Basic credential attached, body parsed as JSON.
//! A successful exchange whose body is empty or not JSON resolves to
//! `Ok(None)`; downstream code must treat that as a legitimate outcome,
//! distinct from a propagated network failure.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::auth::basic_credential;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::feed::PageSource;
use crate::types::{InAppNotification, NotificationsPage};

/// Observes request/response/error events for instrumentation.
///
/// Installed once at construction. Implementations must never alter
/// control flow; the transport ignores anything an observer does.
pub trait ApiObserver: Send + Sync {
    fn on_request(&self, method: &Method, url: &str) {
        let _ = (method, url);
    }
    fn on_response(&self, method: &Method, url: &str, status: StatusCode) {
        let _ = (method, url, status);
    }
    fn on_error(&self, method: &Method, url: &str, error: &Error) {
        let _ = (method, url, error);
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: Arc<ClientConfig>,
    observer: Option<Arc<dyn ApiObserver>>,
}

impl ApiClient {
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self::with_observer(config, None)
    }

    pub fn with_observer(config: Arc<ClientConfig>, observer: Option<Arc<dyn ApiObserver>>) -> Self {
        Self {
            http: Client::new(),
            config,
            observer,
        }
    }

    /// Full request target for a resource under the session's user scope.
    fn endpoint(&self, resource: &str) -> String {
        let host = &self.config.api_host;
        // Local hosts get plain http so in-process fixtures work.
        let scheme = if crate::config::is_local_host(host) {
            "http"
        } else {
            "https"
        };
        format!(
            "{scheme}://{host}/{}/users/{}/{resource}",
            self.config.client_id,
            urlencoding::encode(&self.config.user_id),
        )
    }

    /// Issues one authenticated request.
    ///
    /// Transport-level failures (DNS, refused connection, timeout) propagate
    /// to the caller; retry policy is theirs to decide. The HTTP status is
    /// not turned into an error: whatever JSON the service returned is
    /// handed back, and an empty or non-JSON body is `Ok(None)`.
    pub async fn request(
        &self,
        method: Method,
        resource: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>> {
        let url = self.endpoint(resource);
        let credential = basic_credential(
            &self.config.client_id,
            &self.config.user_id,
            self.config.user_id_hash.as_deref(),
        );
        if let Some(observer) = &self.observer {
            observer.on_request(&method, &url);
        }
        debug!(target: "inapp.api", %method, %url, "dispatching request");

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(header::AUTHORIZATION, format!("Basic {credential}"));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                let err = Error::Http(err);
                if let Some(observer) = &self.observer {
                    observer.on_error(&method, &url, &err);
                }
                return Err(err);
            }
        };

        let status = response.status();
        if let Some(observer) = &self.observer {
            observer.on_response(&method, &url, status);
        }

        let text = response.text().await?;
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                debug!(target: "inapp.api", %status, "response body absent or not json");
                Ok(None)
            }
        }
    }

    /// [`request`](Self::request) plus typed deserialization of a present
    /// body. An absent body stays `None`; a present body that does not fit
    /// `T` is a decode error.
    pub async fn request_typed<T: DeserializeOwned>(
        &self,
        method: Method,
        resource: &str,
        body: Option<&Value>,
    ) -> Result<Option<T>> {
        match self.request(method, resource, body).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl PageSource for ApiClient {
    async fn page_before(&self, before: &str, count: usize) -> Result<Vec<InAppNotification>> {
        let resource = format!(
            "notifications/INAPP_WEB?count={count}&before={}",
            urlencoding::encode(before)
        );
        let page = self
            .request_typed::<NotificationsPage>(Method::GET, &resource, None)
            .await?;
        Ok(page.unwrap_or_default().notifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query, State};
    use axum::http::HeaderMap;
    use axum::routing::{get, patch};
    use axum::{Json, Router};
    use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
    use base64::Engine as _;
    use std::collections::HashMap;
    use std::sync::Mutex;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fixture");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("127.0.0.1:{}", addr.port())
    }

    fn client_for(host: String) -> ApiClient {
        let config = ClientConfig::builder("env-1", "user one/x")
            .user_id_hash("hash-1")
            .api_host(host)
            .build();
        ApiClient::new(Arc::new(config))
    }

    #[derive(Default)]
    struct Captured {
        auth: Mutex<Option<String>>,
        path_user: Mutex<Option<String>>,
        query: Mutex<HashMap<String, String>>,
    }

    #[tokio::test]
    async fn sends_basic_credential_and_encoded_user_path() {
        let captured = Arc::new(Captured::default());
        let state = captured.clone();
        let router = Router::new().route(
            "/:client/users/:user/preferences",
            get(
                |State(state): State<Arc<Captured>>,
                 Path((_, user)): Path<(String, String)>,
                 headers: HeaderMap| async move {
                    *state.path_user.lock().unwrap() = Some(user);
                    *state.auth.lock().unwrap() = headers
                        .get("authorization")
                        .map(|v| v.to_str().unwrap_or_default().to_string());
                    Json(serde_json::json!({"preferences": []}))
                },
            ),
        )
        .with_state(state);

        let host = serve(router).await;
        let client = client_for(host);
        let body = client
            .request(Method::GET, "preferences", None)
            .await
            .expect("request ok");
        assert!(body.is_some());

        // Axum decodes the path segment, so a match proves the client
        // percent-encoded the space and slash in the userId.
        assert_eq!(
            captured.path_user.lock().unwrap().as_deref(),
            Some("user one/x")
        );
        let expected = BASE64_STANDARD.encode("env-1:user one/x:hash-1");
        assert_eq!(
            captured.auth.lock().unwrap().as_deref(),
            Some(format!("Basic {expected}").as_str())
        );
    }

    #[tokio::test]
    async fn absent_body_resolves_to_none() {
        let router = Router::new().route(
            "/:client/users/:user/notifications/INAPP_WEB",
            patch(|| async { axum::http::StatusCode::NO_CONTENT }),
        );
        let host = serve(router).await;
        let client = client_for(host);
        let body = client
            .request(
                Method::PATCH,
                "notifications/INAPP_WEB",
                Some(&serde_json::json!({"trackingIds": []})),
            )
            .await
            .expect("request ok");
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn non_json_body_resolves_to_none() {
        let router = Router::new().route(
            "/:client/users/:user/preferences",
            get(|| async { "plain text, not json" }),
        );
        let host = serve(router).await;
        let client = client_for(host);
        let body = client
            .request(Method::GET, "preferences", None)
            .await
            .expect("request ok");
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn error_status_with_json_body_is_still_surfaced() {
        let router = Router::new().route(
            "/:client/users/:user/preferences",
            get(|| async {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({"message": "bad cursor"})),
                )
            }),
        );
        let host = serve(router).await;
        let client = client_for(host);
        let body = client
            .request(Method::GET, "preferences", None)
            .await
            .expect("request ok")
            .expect("json body present");
        assert_eq!(body["message"], "bad cursor");
    }

    #[tokio::test]
    async fn page_source_requests_count_and_before() {
        let captured = Arc::new(Captured::default());
        let state = captured.clone();
        let router = Router::new().route(
            "/:client/users/:user/notifications/INAPP_WEB",
            get(
                |State(state): State<Arc<Captured>>,
                 Query(query): Query<HashMap<String, String>>| async move {
                    *state.query.lock().unwrap() = query;
                    Json(serde_json::json!({
                        "notifications": [{
                            "id": "n-1",
                            "notificationId": "welcome",
                            "title": "hello",
                            "date": "2023-01-01T00:00:00.000Z"
                        }]
                    }))
                },
            ),
        )
        .with_state(state);

        let host = serve(router).await;
        let client = client_for(host);
        let page = client
            .page_before("2023-01-04T00:00:00.000Z", 25)
            .await
            .expect("page ok");
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, "n-1");

        let query = captured.query.lock().unwrap();
        assert_eq!(query.get("count").map(String::as_str), Some("25"));
        assert_eq!(
            query.get("before").map(String::as_str),
            Some("2023-01-04T00:00:00.000Z")
        );
    }

    #[tokio::test]
    async fn observer_sees_events_without_changing_results() {
        #[derive(Default)]
        struct CountingObserver {
            requests: Mutex<usize>,
            responses: Mutex<usize>,
        }
        impl ApiObserver for CountingObserver {
            fn on_request(&self, _: &Method, _: &str) {
                *self.requests.lock().unwrap() += 1;
            }
            fn on_response(&self, _: &Method, _: &str, _: StatusCode) {
                *self.responses.lock().unwrap() += 1;
            }
        }

        let router = Router::new().route(
            "/:client/users/:user/account_metadata",
            get(|| async { Json(serde_json::json!({"logo": "l"})) }),
        );
        let host = serve(router).await;
        let observer = Arc::new(CountingObserver::default());
        let config = ClientConfig::builder("env-1", "u").api_host(host).build();
        let client = ApiClient::with_observer(Arc::new(config), Some(observer.clone()));

        let body = client
            .request(Method::GET, "account_metadata", None)
            .await
            .expect("request ok")
            .expect("body present");
        assert_eq!(body["logo"], "l");
        assert_eq!(*observer.requests.lock().unwrap(), 1);
        assert_eq!(*observer.responses.lock().unwrap(), 1);
    }
}
