use std::fmt;

use http::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// The four round trips against the collection endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation { List, Create, Update, Delete }

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::List => "load todos",
            Operation::Create => "add todo",
            Operation::Update => "update todo",
            Operation::Delete => "delete todo",
        })
    }
}

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("cannot reach the todo server at {endpoint}; check that it is running")]
    Unreachable { endpoint: String },

    #[error("{message}")]
    Http { status: StatusCode, message: String },

    #[error("failed to {operation}: invalid response body ({detail})")]
    Decode { operation: Operation, detail: String },

    #[error("cannot {operation} without an id; refresh and try again")]
    MissingId { operation: Operation },

    #[error("todo {id} is not in the list; refresh and try again")]
    UnknownItem { id: String },

    #[error("todo text must not be empty")]
    EmptyTitle,
}

impl TodoError {
    /// Builds the HTTP-level error from a non-success response body: a JSON
    /// `message` or `error` string wins, other JSON gets the templated
    /// message, non-JSON text is used as is, and an empty body falls back to
    /// the status code.
    pub fn from_response(operation: Operation, status: StatusCode, body: &str) -> Self {
        let code = status.as_u16();
        let message = match serde_json::from_str::<Value>(body) {
            Ok(parsed) => ["message", "error"]
                .iter()
                .filter_map(|field| parsed.get(*field).and_then(Value::as_str))
                .find(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("failed to {operation} ({code})")),
            Err(_) if body.trim().is_empty() => format!("server error ({code})"),
            Err(_) => body.to_string(),
        };
        Self::Http { status, message }
    }

    /// Local precondition failures never reached the network.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::MissingId { .. } | Self::UnknownItem { .. } | Self::EmptyTitle)
    }
}
