use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::api::retry::{with_retry, RetryPolicy};
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{
    object::{AstralObject, ObjectKind, PlacementRequest},
    wire::{CurrentMapResponse, GoalMapResponse, ObjectBody},
    Coordinate,
};

/// Operations offered by the remote megaverse service.
#[async_trait]
pub trait MegaverseApi: Send + Sync {
    async fn place(&self, request: &PlacementRequest) -> Result<(), ApiError>;

    async fn remove(&self, kind: ObjectKind, at: Coordinate) -> Result<(), ApiError>;

    /// `GET /map/{candidateId}`
    async fn current_map(&self) -> Result<CurrentMapResponse, ApiError>;

    /// `GET /map/{candidateId}/goal`
    async fn goal_map(&self) -> Result<GoalMapResponse, ApiError>;
}

/// HTTP client for the megaverse service. Every call goes through the retry policy.
#[derive(Debug, Clone)]
pub struct MegaverseClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    candidate_id: String,
    retry: RetryPolicy,
}

impl MegaverseClient {
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("megaverse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ApiError::Transport {
                operation: "build http client".into(),
                source,
            })?;
        Ok(Self {
            http,
            base_url: config.base_url,
            api_key: config.api_key,
            candidate_id: config.candidate_id,
            retry: config.retry,
        })
    }

    /// Candidate the client acts for, as sent in bodies and map paths.
    pub fn candidate_id(&self) -> &str {
        &self.candidate_id
    }

    pub async fn place_polyanet(&self, row: usize, column: usize) -> Result<(), ApiError> {
        let request = PlacementRequest::new(Coordinate::new(row, column), AstralObject::Polyanet);
        self.place(&request).await
    }

    pub async fn place_soloon(&self, row: usize, column: usize, color: &str) -> Result<(), ApiError> {
        let object = AstralObject::Soloon {
            color: color.to_string(),
        };
        self.place(&PlacementRequest::new(Coordinate::new(row, column), object))
            .await
    }

    pub async fn place_cometh(
        &self,
        row: usize,
        column: usize,
        direction: &str,
    ) -> Result<(), ApiError> {
        let object = AstralObject::Cometh {
            direction: direction.to_string(),
        };
        self.place(&PlacementRequest::new(Coordinate::new(row, column), object))
            .await
    }

    pub async fn remove_polyanet(&self, row: usize, column: usize) -> Result<(), ApiError> {
        self.remove(ObjectKind::Polyanet, Coordinate::new(row, column))
            .await
    }

    pub async fn remove_soloon(&self, row: usize, column: usize) -> Result<(), ApiError> {
        self.remove(ObjectKind::Soloon, Coordinate::new(row, column))
            .await
    }

    pub async fn remove_cometh(&self, row: usize, column: usize) -> Result<(), ApiError> {
        self.remove(ObjectKind::Cometh, Coordinate::new(row, column))
            .await
    }

    async fn send(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        body: Option<&ObjectBody>,
    ) -> Result<String, ApiError> {
        with_retry(&self.retry, || {
            self.send_once(operation, method.clone(), path, body)
        })
        .await
    }

    async fn send_once(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        body: Option<&ObjectBody>,
    ) -> Result<String, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("{method} {url}");

        let mut request = self.http.request(method, &url).bearer_auth(&self.api_key);
        if let Some(body) = body {
            request = request.json(body);
        }
        let transport = |source| ApiError::Transport {
            operation: operation.to_string(),
            source,
        };
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let text = response.text().await;
        if !status.is_success() {
            if let Err(e) = &text {
                log::debug!("{operation}: could not read error body: {e}");
            }
            return Err(ApiError::http(
                operation,
                status.as_u16(),
                text.unwrap_or_default(),
            ));
        }
        text.map_err(transport)
    }

    async fn get_json<T: DeserializeOwned>(&self, operation: &str, path: &str) -> Result<T, ApiError> {
        let text = self.send(operation, Method::GET, path, None).await?;
        serde_json::from_str(&text).map_err(|source| ApiError::Decode {
            operation: operation.to_string(),
            source,
        })
    }
}

#[async_trait]
impl MegaverseApi for MegaverseClient {
    async fn place(&self, request: &PlacementRequest) -> Result<(), ApiError> {
        let body = ObjectBody::placement(request, &self.candidate_id);
        let operation = request.describe();
        self.send(
            &operation,
            Method::POST,
            request.object.kind().endpoint(),
            Some(&body),
        )
        .await?;
        Ok(())
    }

    async fn remove(&self, kind: ObjectKind, at: Coordinate) -> Result<(), ApiError> {
        let body = ObjectBody::removal(at, &self.candidate_id);
        let operation = format!("remove {kind} at {at}");
        self.send(&operation, Method::DELETE, kind.endpoint(), Some(&body))
            .await?;
        Ok(())
    }

    async fn current_map(&self) -> Result<CurrentMapResponse, ApiError> {
        let path = format!("/map/{}", self.candidate_id);
        self.get_json("fetch current grid", &path).await
    }

    async fn goal_map(&self) -> Result<GoalMapResponse, ApiError> {
        let path = format!("/map/{}/goal", self.candidate_id);
        self.get_json("fetch goal grid", &path).await
    }
}
