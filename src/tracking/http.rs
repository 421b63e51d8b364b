//! Tracking server client.
//!
//! # Endpoints
//! - `POST /api/v1/tasks` → `{ "id": "<uuid>" }`
//! - `POST /api/v1/tasks/{id}/events` (one ReportEvent)
//! - `POST /api/v1/tasks/{id}/artifacts` (`{ "name", "value" }`)
//! - `POST /api/v1/tasks/{id}/close` (`{ "status" }`)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::{ReportEvent, ReportSink, TaskStatus, Tracker, TrackingError};
use crate::config::TaskSettings;

#[derive(Debug, Serialize)]
struct CreateTaskRequest<'a> {
    project: &'a str,
    name: &'a str,
    tags: &'a [String],
}

#[derive(Debug, Deserialize)]
struct CreateTaskResponse {
    id: Uuid,
}

#[derive(Debug, Serialize)]
struct CloseTaskRequest {
    status: TaskStatus,
}

/// A tracker that reports to a remote tracking server.
#[derive(Debug, Clone)]
pub struct HttpTracker {
    client: Client,
    base: Url,
}

impl HttpTracker {
    pub fn new(base: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, TrackingError> {
        let base = Url::parse(base)
            .map_err(|e| TrackingError::InvalidConfig(format!("invalid url '{}': {}", base, e)))?;

        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|_| TrackingError::InvalidConfig("api key is not a valid header value".into()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base })
    }

    fn endpoint(base: &Url, path: &str) -> Result<Url, TrackingError> {
        let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|e| TrackingError::InvalidConfig(e.to_string()))
    }
}

async fn check(res: Response) -> Result<Response, TrackingError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(TrackingError::Rejected {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl Tracker for HttpTracker {
    async fn begin(&self, settings: &TaskSettings) -> Result<Box<dyn ReportSink>, TrackingError> {
        let request = CreateTaskRequest {
            project: settings.project(),
            name: settings.task_name(),
            tags: settings.tags(),
        };
        let res = self
            .client
            .post(Self::endpoint(&self.base, "api/v1/tasks")?)
            .json(&request)
            .send()
            .await?;
        let created: CreateTaskResponse = check(res).await?.json().await?;

        tracing::debug!(task_id = %created.id, server = %self.base, "Remote task opened");
        Ok(Box::new(HttpSink {
            client: self.client.clone(),
            base: self.base.clone(),
            id: created.id,
            closed: false,
        }))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

struct HttpSink {
    client: Client,
    base: Url,
    id: Uuid,
    closed: bool,
}

impl HttpSink {
    async fn post<T: Serialize + Sync>(&self, suffix: &str, body: &T) -> Result<(), TrackingError> {
        let url = HttpTracker::endpoint(&self.base, &format!("api/v1/tasks/{}/{}", self.id, suffix))?;
        let res = self.client.post(url).json(body).send().await?;
        check(res).await?;
        Ok(())
    }
}

#[async_trait]
impl ReportSink for HttpSink {
    fn task_id(&self) -> Uuid {
        self.id
    }

    async fn record(&mut self, event: ReportEvent) -> Result<(), TrackingError> {
        if self.closed {
            return Err(TrackingError::Closed(self.id));
        }
        match &event {
            ReportEvent::Artifact { name, value } => {
                self.post("artifacts", &serde_json::json!({ "name": name, "value": value }))
                    .await
            }
            _ => self.post("events", &event).await,
        }
    }

    async fn close(&mut self, status: TaskStatus) -> Result<(), TrackingError> {
        if self.closed {
            return Err(TrackingError::Closed(self.id));
        }
        self.post("close", &CloseTaskRequest { status }).await?;
        self.closed = true;
        Ok(())
    }
}
