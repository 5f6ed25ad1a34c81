//! HTTP client for the hosted store's REST interface (`/rest/v1/<table>`).
//!
//! One client type, two privilege tiers: the anonymous key for public reads
//! and the service-role key for server-only writes. Both are constructed
//! once at startup and shared through `ApiContext`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;

use super::{DataStore, DatabaseError, Query};

const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    Anon,
    ServiceRole,
}

pub struct RestStore {
    base_url: String,
    key: String,
    privilege: Privilege,
    client: reqwest::Client,
}

/// Error body returned by the store on 4xx/5xx.
#[derive(Deserialize)]
struct StoreErrorBody {
    message: Option<String>,
    details: Option<String>,
}

impl RestStore {
    pub fn new(base_url: &str, key: &str, privilege: Privilege) -> Result<Self, DatabaseError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            privilege,
            client,
        })
    }

    pub fn privilege(&self) -> Privilege {
        self.privilege
    }

    fn request(&self, method: Method, table: &str, query: &Query) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        self.client
            .request(method, url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .query(&query.to_params())
    }

    async fn send(&self, table: &str, request: RequestBuilder) -> Result<Response, DatabaseError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(table, error = %e, "store request failed");
            DatabaseError::Connection(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<StoreErrorBody>(&body)
            .ok()
            .and_then(|b| match (b.message, b.details) {
                (Some(m), Some(d)) => Some(format!("{m} ({d})")),
                (Some(m), None) => Some(m),
                (None, d) => d,
            })
            .unwrap_or(body);

        tracing::warn!(table, status = status.as_u16(), %message, "store rejected request");
        Err(DatabaseError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn rows(response: Response) -> Result<Vec<Value>, DatabaseError> {
        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| DatabaseError::Decode(e.to_string()))
    }
}

#[async_trait]
impl DataStore for RestStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, DatabaseError> {
        let request = self
            .request(Method::GET, table, query)
            .query(&[("select", "*")]);
        let response = self.send(table, request).await?;
        Self::rows(response).await
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, DatabaseError> {
        let request = self
            .request(Method::POST, table, &Query::new())
            .header("Prefer", "return=representation")
            .json(&rows);
        let response = self.send(table, request).await?;
        Self::rows(response).await
    }

    async fn update(
        &self,
        table: &str,
        query: &Query,
        patch: Value,
    ) -> Result<Vec<Value>, DatabaseError> {
        let request = self
            .request(Method::PATCH, table, query)
            .header("Prefer", "return=representation")
            .json(&patch);
        let response = self.send(table, request).await?;
        Self::rows(response).await
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Value>,
        on_conflict: &str,
    ) -> Result<Vec<Value>, DatabaseError> {
        let request = self
            .request(Method::POST, table, &Query::new())
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&rows);
        let response = self.send(table, request).await?;
        Self::rows(response).await
    }

    async fn delete(&self, table: &str, query: &Query) -> Result<(), DatabaseError> {
        let request = self.request(Method::DELETE, table, query);
        self.send(table, request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::extract::{Path, Query as QueryParams};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    /// Stub store: echoes headers and params back so the client's request
    /// shape can be asserted; table `broken` always fails.
    async fn spawn_stub() -> String {
        async fn table(
            Path(table): Path<String>,
            QueryParams(params): QueryParams<HashMap<String, String>>,
            headers: HeaderMap,
        ) -> (StatusCode, Json<Value>) {
            if table == "broken" {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"message": "column \"nope\" does not exist"})),
                );
            }
            let header = |name: &str| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            };
            (
                StatusCode::OK,
                Json(json!([{
                    "table": table,
                    "params": params,
                    "apikey": header("apikey"),
                    "authorization": header("authorization"),
                    "prefer": header("prefer"),
                }])),
            )
        }

        let app = Router::new().route("/rest/v1/:table", get(table).post(table).patch(table));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn select_sends_key_and_filters() {
        let base = spawn_stub().await;
        let store = RestStore::new(&base, "anon-key", Privilege::Anon).unwrap();

        let rows = store
            .select("health_centers", &Query::new().eq("approved", true).limit(10))
            .await
            .unwrap();

        let echo = &rows[0];
        assert_eq!(echo["table"], "health_centers");
        assert_eq!(echo["apikey"], "anon-key");
        assert_eq!(echo["authorization"], "Bearer anon-key");
        assert_eq!(echo["params"]["approved"], "eq.true");
        assert_eq!(echo["params"]["limit"], "10");
        assert_eq!(echo["params"]["select"], "*");
        assert_eq!(store.privilege(), Privilege::Anon);
    }

    #[tokio::test]
    async fn upsert_requests_merge_resolution() {
        let base = spawn_stub().await;
        let store = RestStore::new(&base, "service-key", Privilege::ServiceRole).unwrap();

        let rows = store
            .upsert("doctors", vec![json!({"id": "x"})], "id")
            .await
            .unwrap();

        assert_eq!(rows[0]["params"]["on_conflict"], "id");
        assert_eq!(
            rows[0]["prefer"],
            "resolution=merge-duplicates,return=representation"
        );
    }

    #[tokio::test]
    async fn rejected_request_surfaces_store_message() {
        let base = spawn_stub().await;
        let store = RestStore::new(&base, "k", Privilege::ServiceRole).unwrap();

        let err = store.select("broken", &Query::new()).await.unwrap_err();
        match err {
            DatabaseError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("does not exist"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_store_is_connection_error() {
        let store = RestStore::new("http://127.0.0.1:1", "k", Privilege::Anon).unwrap();
        let err = store.select("doctors", &Query::new()).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Connection(_)));
    }
}
