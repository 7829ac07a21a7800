//! `reqwest`-backed document store gateway
//!
//! [`HttpGateway`] maps each [`GatewayRequest`] onto one HTTP call against
//! the configured store root. No retries and no per-request timeout are
//! applied: a call that never resolves leaves the caller pending.
//!
//! [`HttpImageStore`] posts place images as multipart form data.

use reqwest::multipart::{Form, Part};
use url::Url;

use crate::error::{Result, StaybookError};
use crate::gateway::{
    GatewayRequest, ImageStore, ImageUpload, Method, RemoteGateway, StoredImage,
};

/// HTTP gateway to a keyed JSON document store.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use staybook::gateway::http::HttpGateway;
///
/// let gateway = HttpGateway::new(Url::parse("https://example.firebaseio.com").unwrap());
/// assert_eq!(gateway.base_url().as_str(), "https://example.firebaseio.com/");
/// ```
#[derive(Debug, Clone)]
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpGateway {
    /// Creates a gateway rooted at `base_url` with a default client.
    pub fn new(base_url: Url) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a gateway sharing an existing client.
    ///
    /// A trailing slash is added to `base_url` when missing so that relative
    /// record paths extend it instead of replacing its last segment.
    pub fn with_client(http: reqwest::Client, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends `path` segment by segment; each segment is percent-encoded,
    /// so `..`, `?` or `#` inside an id never change the target.
    fn url_for(&self, path: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                StaybookError::Transport(format!("cannot append '{}' to {}", path, self.base_url))
            })?
            .pop_if_empty()
            .extend(path.trim_start_matches('/').split('/'));
        Ok(url)
    }
}

#[async_trait::async_trait]
impl RemoteGateway for HttpGateway {
    async fn execute(&self, request: GatewayRequest) -> Result<serde_json::Value> {
        let url = self.url_for(&request.path)?;
        tracing::debug!(method = %request.method, path = %request.path, "document store request");

        let mut builder = match request.method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
            Method::Put => self.http.put(url),
            Method::Delete => self.http.delete(url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(StaybookError::Http)?;
        let status = response.status();
        let text = response.text().await.map_err(StaybookError::Http)?;

        if !status.is_success() {
            tracing::debug!(method = %request.method, path = %request.path, %status, "document store rejected request");
            return Err(StaybookError::Transport(format!(
                "{} {} returned HTTP {}: {}",
                request.method, request.path, status, text
            ))
            .into());
        }

        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        let payload = serde_json::from_str(&text).map_err(StaybookError::Serialization)?;
        Ok(payload)
    }
}

/// Image upload endpoint reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpImageStore {
    http: reqwest::Client,
    upload_url: Url,
}

impl HttpImageStore {
    pub fn new(upload_url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            upload_url,
        }
    }
}

#[async_trait::async_trait]
impl ImageStore for HttpImageStore {
    async fn store(&self, image: ImageUpload, token: &str) -> Result<StoredImage> {
        tracing::debug!(file = %image.file_name, size = image.bytes.len(), "uploading image");
        let part = Part::bytes(image.bytes).file_name(image.file_name);
        let form = Form::new().part("image", part);

        let response = self
            .http
            .post(self.upload_url.clone())
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(StaybookError::Http)?;
        let status = response.status();
        let text = response.text().await.map_err(StaybookError::Http)?;

        if !status.is_success() {
            return Err(StaybookError::Transport(format!(
                "image upload returned HTTP {}: {}",
                status, text
            ))
            .into());
        }
        let stored = serde_json::from_str(&text).map_err(StaybookError::Serialization)?;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway_for(server: &MockServer) -> HttpGateway {
        HttpGateway::new(Url::parse(&server.uri()).unwrap())
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let gateway = HttpGateway::new(Url::parse("http://localhost:9000/db").unwrap());
        assert_eq!(gateway.base_url().as_str(), "http://localhost:9000/db/");
        assert_eq!(
            gateway.url_for("offered-places.json").unwrap().as_str(),
            "http://localhost:9000/db/offered-places.json"
        );
    }

    #[test]
    fn test_url_for_encodes_each_segment() {
        let gateway = HttpGateway::new(Url::parse("http://localhost:9000").unwrap());
        assert_eq!(
            gateway.url_for("my-bookings/a?b#c.json").unwrap().as_str(),
            "http://localhost:9000/my-bookings/a%3Fb%23c.json"
        );
        assert_eq!(
            gateway.url_for("my-bookings/../offered-places.json").unwrap().as_str(),
            "http://localhost:9000/my-bookings/offered-places.json"
        );
    }

    #[tokio::test]
    async fn test_id_with_question_mark_stays_in_path() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/my-bookings/a%3Fb.json"))
            .and(query_param("auth", "T1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        gateway_for(&server)
            .execute(GatewayRequest::delete("my-bookings/a?b.json").with_query("auth", "T1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_image_upload_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storeImage"))
            .and(header("authorization", "Bearer T1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "imageUrl": "https://img.example/uploads/1.jpg",
                "imagePath": "uploads/1.jpg"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpImageStore::new(Url::parse(&format!("{}/storeImage", server.uri())).unwrap());
        let stored = store
            .store(
                ImageUpload {
                    file_name: "fog.jpg".to_string(),
                    bytes: vec![0xff, 0xd8, 0xff],
                },
                "T1",
            )
            .await
            .unwrap();

        assert_eq!(stored.image_url, "https://img.example/uploads/1.jpg");
        let received = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&received[0].body);
        assert!(body.contains("name=\"image\""));
        assert!(body.contains("filename=\"fog.jpg\""));
    }

    #[tokio::test]
    async fn test_image_upload_rejection_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let store = HttpImageStore::new(Url::parse(&server.uri()).unwrap());
        let err = store
            .store(
                ImageUpload {
                    file_name: "a.png".to_string(),
                    bytes: Vec::new(),
                },
                "T1",
            )
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<StaybookError>().unwrap().is_transport());
    }

    #[tokio::test]
    async fn test_get_sends_query_and_decodes_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/offered-places.json"))
            .and(query_param("auth", "T1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"a": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let payload = gateway_for(&server)
            .execute(GatewayRequest::get("offered-places.json").with_query("auth", "T1"))
            .await
            .unwrap();
        assert_eq!(payload, serde_json::json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/my-bookings.json"))
            .and(body_json(serde_json::json!({"guestNumber": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": "-N1"})))
            .mount(&server)
            .await;

        let payload = gateway_for(&server)
            .execute(GatewayRequest::post(
                "my-bookings.json",
                serde_json::json!({"guestNumber": 2}),
            ))
            .await
            .unwrap();
        assert_eq!(payload["name"], "-N1");
    }

    #[tokio::test]
    async fn test_empty_body_decodes_to_null() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/my-bookings/-N1.json"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let payload = gateway_for(&server)
            .execute(GatewayRequest::delete("my-bookings/-N1.json"))
            .await
            .unwrap();
        assert!(payload.is_null());
    }

    #[tokio::test]
    async fn test_error_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("{\"error\":\"Permission denied\"}"))
            .mount(&server)
            .await;

        let err = gateway_for(&server)
            .execute(GatewayRequest::get("offered-places.json"))
            .await
            .unwrap_err();
        let err = err.downcast_ref::<StaybookError>().expect("staybook error");
        assert!(matches!(err, StaybookError::Transport(msg) if msg.contains("401")));
    }

    #[tokio::test]
    async fn test_malformed_body_is_serialization_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = gateway_for(&server)
            .execute(GatewayRequest::get("offered-places.json"))
            .await
            .unwrap_err();
        let err = err.downcast_ref::<StaybookError>().expect("staybook error");
        assert!(err.is_transport());
    }
}
