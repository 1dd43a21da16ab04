use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Url};
use serde_json::Value;

use crate::config::ApiConfig;
use crate::domain::{
    error::{Operation, TodoError},
    repository::TodoRepository,
    todo::{normalize_list, NewTodo, TodoItem},
};

/// `TodoRepository` over the REST collection endpoint. No timeout is set;
/// requests run with the transport defaults.
#[derive(Clone)]
pub struct HttpTodoRepository {
    client: Client,
    config: ApiConfig,
}

impl HttpTodoRepository {
    pub fn new(config: ApiConfig) -> Self {
        Self { client: Client::new(), config }
    }

    pub fn endpoint(&self) -> String { self.config.collection_url() }

    fn item_url(&self, id: &str) -> Result<Url, TodoError> {
        self.config.item_url(id).ok_or_else(|| {
            tracing::error!(endpoint = %self.endpoint(), "configured endpoint is not a valid URL");
            TodoError::Unreachable { endpoint: self.endpoint() }
        })
    }

    /// Sends the request and returns the body of a 2xx response. Transport
    /// failures and non-2xx statuses become the matching `TodoError`.
    async fn send(&self, operation: Operation, request: RequestBuilder) -> Result<String, TodoError> {
        let endpoint = self.endpoint();
        let response = request
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::error!(%operation, %endpoint, error = %e, "request failed before a response");
                TodoError::Unreachable { endpoint: endpoint.clone() }
            })?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!(%operation, %endpoint, error = %e, "failed to read response body");
            TodoError::Unreachable { endpoint: endpoint.clone() }
        })?;
        if !status.is_success() {
            let err = TodoError::from_response(operation, status, &body);
            tracing::error!(%operation, %endpoint, status = status.as_u16(), body = %body, "server rejected request");
            return Err(err);
        }
        Ok(body)
    }

    /// Create and update echo the stored item; it is only logged, the
    /// follow-up list read is what the client keeps.
    fn log_echo(operation: Operation, body: &str) {
        match serde_json::from_str::<Value>(body) {
            Ok(echo) => tracing::debug!(%operation, %echo, "server echoed item"),
            Err(_) if body.is_empty() => tracing::debug!(%operation, "empty success body"),
            Err(e) => tracing::debug!(%operation, error = %e, "success body is not JSON"),
        }
    }
}

#[async_trait]
impl TodoRepository for HttpTodoRepository {
    async fn list(&self) -> Result<Vec<TodoItem>, TodoError> {
        let body = self.send(Operation::List, self.client.get(self.endpoint())).await?;
        let parsed: Value = serde_json::from_str(&body)
            .map_err(|e| TodoError::Decode { operation: Operation::List, detail: e.to_string() })?;
        Ok(normalize_list(&parsed))
    }

    async fn create(&self, input: &NewTodo) -> Result<(), TodoError> {
        tracing::debug!(title = %input.title, "creating todo");
        let body = self.send(Operation::Create, self.client.post(self.endpoint()).json(input)).await?;
        Self::log_echo(Operation::Create, &body);
        tracing::info!(title = %input.title, "todo created");
        Ok(())
    }

    async fn update(&self, id: &str, item: &TodoItem) -> Result<(), TodoError> {
        let payload = item.to_wire();
        tracing::debug!(%id, %payload, "updating todo");
        let body = self.send(Operation::Update, self.client.put(self.item_url(id)?).json(&payload)).await?;
        Self::log_echo(Operation::Update, &body);
        tracing::info!(%id, "todo updated");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), TodoError> {
        let body = self.send(Operation::Delete, self.client.delete(self.item_url(id)?)).await?;
        Self::log_echo(Operation::Delete, &body);
        tracing::info!(%id, "todo deleted");
        Ok(())
    }
}
