use async_trait::async_trait;
use super::error::TodoError;
use super::todo::{NewTodo, TodoItem};

/// The remote collection. Writes return nothing useful to the caller: the
/// list is always re-read after a successful write.
#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn list(&self) -> Result<Vec<TodoItem>, TodoError>;
    async fn create(&self, input: &NewTodo) -> Result<(), TodoError>;
    async fn update(&self, id: &str, item: &TodoItem) -> Result<(), TodoError>;
    async fn delete(&self, id: &str) -> Result<(), TodoError>;
}
