//! Scripted in-process gateway for unit tests
//!
//! [`FakeGateway`] records every request it receives and answers from a
//! FIFO script. A scripted answer can be *gated*: the request stays pending
//! until the test releases it through the returned [`oneshot::Sender`],
//! which lets tests choose the order in which overlapping operations
//! complete.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::error::{Result, StaybookError};
use crate::gateway::{GatewayRequest, ImageStore, ImageUpload, RemoteGateway, StoredImage};

#[derive(Debug)]
enum Scripted {
    Ready(std::result::Result<serde_json::Value, String>),
    Gated(oneshot::Receiver<serde_json::Value>),
}

/// Scripted fake implementing [`RemoteGateway`].
#[derive(Debug, Default)]
pub struct FakeGateway {
    requests: Mutex<Vec<GatewayRequest>>,
    script: Mutex<VecDeque<Scripted>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an immediate successful payload.
    pub fn push_json(&self, payload: serde_json::Value) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Ready(Ok(payload)));
    }

    /// Queues an immediate transport failure.
    pub fn push_error(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Ready(Err(message.to_string())));
    }

    /// Queues a payload released later through the returned sender.
    pub fn push_gated(&self) -> oneshot::Sender<serde_json::Value> {
        let (tx, rx) = oneshot::channel();
        self.script.lock().unwrap().push_back(Scripted::Gated(rx));
        tx
    }

    /// Every request seen so far, in arrival order.
    pub fn requests(&self) -> Vec<GatewayRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl RemoteGateway for FakeGateway {
    async fn execute(&self, request: GatewayRequest) -> Result<serde_json::Value> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();

        match next {
            Some(Scripted::Ready(Ok(payload))) => Ok(payload),
            Some(Scripted::Ready(Err(message))) => Err(StaybookError::Transport(message).into()),
            Some(Scripted::Gated(rx)) => rx.await.map_err(|_| {
                StaybookError::Transport(format!("gate for {} dropped", request.path)).into()
            }),
            None => Err(StaybookError::Transport(format!(
                "no scripted response for {} {}",
                request.method, request.path
            ))
            .into()),
        }
    }
}

/// Image store that records uploads and answers with a fixed URL scheme.
#[derive(Debug, Default)]
pub struct FakeImageStore {
    uploads: Mutex<Vec<(ImageUpload, String)>>,
}

impl FakeImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every upload with the token it carried.
    pub fn uploads(&self) -> Vec<(ImageUpload, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ImageStore for FakeImageStore {
    async fn store(&self, image: ImageUpload, token: &str) -> Result<StoredImage> {
        let stored = StoredImage {
            image_url: format!("https://img.example/uploads/{}", image.file_name),
            image_path: format!("uploads/{}", image.file_name),
        };
        self.uploads.lock().unwrap().push((image, token.to_string()));
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_answers_in_script_order() {
        let fake = FakeGateway::new();
        fake.push_json(serde_json::json!(1));
        fake.push_error("boom");

        let first = fake.execute(GatewayRequest::get("a.json")).await.unwrap();
        assert_eq!(first, serde_json::json!(1));
        let second = fake.execute(GatewayRequest::get("b.json")).await;
        assert!(second.is_err());
        assert_eq!(fake.request_count(), 2);
    }

    #[tokio::test]
    async fn test_gated_answer_waits_for_release() {
        let fake = FakeGateway::new();
        let gate = fake.push_gated();
        gate.send(serde_json::json!({"name": "-N1"})).unwrap();

        let payload = fake.execute(GatewayRequest::get("a.json")).await.unwrap();
        assert_eq!(payload["name"], "-N1");
    }

    #[tokio::test]
    async fn test_empty_script_is_an_error() {
        let fake = FakeGateway::new();
        assert!(fake.execute(GatewayRequest::get("a.json")).await.is_err());
        assert_eq!(fake.requests()[0].path, "a.json");
    }
}
