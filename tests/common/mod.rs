use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::TempDir;
use url::Url;
use wiremock::MockServer;

use staybook::auth::exchange::HttpCredentialExchange;
use staybook::auth::record_store::{MemoryRecordStore, SessionRecord};
use staybook::gateway::http::{HttpGateway, HttpImageStore};
use staybook::App;

/// App whose document store and identity endpoint both live on `server`.
///
/// The identity endpoints are served under `/v1`, image uploads at
/// `/storeImage`.
#[allow(dead_code)]
pub fn app_for(server: &MockServer, records: Arc<MemoryRecordStore>) -> App {
    let gateway = HttpGateway::new(Url::parse(&server.uri()).expect("valid url"));
    let images = HttpImageStore::new(
        Url::parse(&format!("{}/storeImage", server.uri())).expect("valid url"),
    );
    let exchange = HttpCredentialExchange::new(
        Url::parse(&format!("{}/v1", server.uri())).expect("valid url"),
        "test-key".to_string(),
    );
    App::new(Arc::new(gateway), Arc::new(images), Arc::new(exchange), records)
}

/// App restored from a persisted record for `user_id` / `token`.
#[allow(dead_code)]
pub async fn signed_in_app(server: &MockServer, user_id: &str, token: &str) -> App {
    let records = Arc::new(MemoryRecordStore::with_record(SessionRecord {
        user_id: user_id.to_string(),
        token: token.to_string(),
        token_expires_at: Utc::now() + Duration::hours(1),
    }));
    let app = app_for(server, records);
    assert!(app.session.auto_login().await.expect("auto login"));
    app
}

#[allow(dead_code)]
pub fn place_json(title: &str, owner_id: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "description": "In the heart of the city",
        "imageUrl": "https://img.example/place.jpg",
        "price": 149.99,
        "availableFrom": "2019-01-01T00:00:00.000Z",
        "availableTo": "2019-12-31T00:00:00.000Z",
        "ownerId": owner_id
    })
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
