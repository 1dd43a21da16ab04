use std::{future::Future, sync::Arc};

use crate::domain::{
    error::{Operation, TodoError},
    repository::TodoRepository,
    todo::{NewTodo, TodoId, TodoItem, TodoPatch},
};

/// Blocking yes/no question asked before a delete.
pub trait ConfirmPrompt {
    fn confirm(&mut self, question: &str) -> bool;
}

/// A row in edit mode. Identified items are matched by id; unidentified ones
/// by their position in the list.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub row: usize,
    pub id: TodoId,
    pub text: String,
}

/// Everything the view renders.
#[derive(Debug, Clone, Default)]
pub struct ListState {
    pub items: Vec<TodoItem>,
    pub draft: String,
    pub editing: Option<EditSession>,
    pub loading: bool,
    pub error: Option<String>,
}

impl ListState {
    pub fn is_editing(&self, row: usize) -> bool {
        let Some(session) = &self.editing else { return false };
        match (&session.id, self.items.get(row).map(|item| &item.id)) {
            (TodoId::Identified(target), Some(TodoId::Identified(id))) => target == id,
            (TodoId::Unidentified, Some(TodoId::Unidentified)) => session.row == row,
            _ => false,
        }
    }

    /// A session survives a re-read only if it targets an id that is still
    /// listed; row positions of unidentified items are not stable.
    fn session_still_valid(&self) -> bool {
        match self.editing.as_ref().map(|session| &session.id) {
            Some(TodoId::Identified(target)) => self.items.iter().any(|item| matches!(&item.id, TodoId::Identified(id) if id == target)),
            Some(TodoId::Unidentified) => false,
            None => true,
        }
    }

    pub fn is_empty_view(&self) -> bool {
        !self.loading && self.items.is_empty() && self.error.is_none()
    }
}

/// Mirrors the remote collection. Every successful write is followed by a
/// full re-read, and the list is only ever replaced wholesale by that read.
pub struct TodoListClient<R: TodoRepository> {
    repo: Arc<R>,
    state: ListState,
}

impl<R: TodoRepository> TodoListClient<R> {
    pub fn new(repo: R) -> Self { Self { repo: Arc::new(repo), state: ListState::default() } }

    pub fn state(&self) -> &ListState { &self.state }

    pub fn repository(&self) -> &R { &self.repo }

    pub fn draft_mut(&mut self) -> &mut String { &mut self.state.draft }

    pub fn edit_text_mut(&mut self) -> Option<&mut String> {
        self.state.editing.as_mut().map(|session| &mut session.text)
    }

    fn fail(&mut self, operation: Operation, err: TodoError) -> Result<(), TodoError> {
        tracing::error!(%operation, error = %err, "operation failed");
        self.state.error = Some(err.to_string());
        Err(err)
    }

    /// Replaces the list with the remote collection. On failure the list is
    /// emptied and the error recorded.
    pub async fn fetch_all(&mut self) -> Result<(), TodoError> {
        let pending = self.start_fetch();
        let result = pending.await;
        self.finish_fetch(result)
    }

    /// Sets the loading flag and hands back the list request, which does not
    /// borrow the client so the view can render while it runs.
    pub fn start_fetch(&mut self) -> impl Future<Output = Result<Vec<TodoItem>, TodoError>> + Send + use<R> {
        self.state.loading = true;
        self.state.error = None;
        let repo = Arc::clone(&self.repo);
        async move { repo.list().await }
    }

    /// Applies the outcome of `start_fetch`; always clears the loading flag.
    pub fn finish_fetch(&mut self, result: Result<Vec<TodoItem>, TodoError>) -> Result<(), TodoError> {
        self.state.loading = false;
        let outcome = match result {
            Ok(items) => {
                tracing::debug!(count = items.len(), "todo list loaded");
                self.state.items = items;
                Ok(())
            }
            Err(err) => {
                self.state.items.clear();
                self.fail(Operation::List, err)
            }
        };
        if !self.state.session_still_valid() {
            tracing::debug!("edit session no longer matches a listed todo");
            self.state.editing = None;
        }
        outcome
    }

    pub async fn retry(&mut self) -> Result<(), TodoError> { self.fetch_all().await }

    /// Blank text is ignored. The draft is cleared only once the write
    /// succeeded, so a failed create can be retried as typed.
    pub async fn create(&mut self, text: &str) -> Result<(), TodoError> {
        let title = text.trim();
        if title.is_empty() { return Ok(()); }
        self.state.error = None;
        if let Err(err) = self.repo.create(&NewTodo { title: title.to_string() }).await {
            return self.fail(Operation::Create, err);
        }
        let refreshed = self.fetch_all().await;
        self.state.draft.clear();
        refreshed
    }

    pub async fn submit_draft(&mut self) -> Result<(), TodoError> {
        let text = self.state.draft.clone();
        self.create(&text).await
    }

    /// Sends the current record for `id` with `patch` applied. An
    /// unidentified target fails locally and leaves edit mode; an id that is
    /// not in the list fails locally too, since there is nothing to merge.
    pub async fn update(&mut self, id: &TodoId, patch: &TodoPatch) -> Result<(), TodoError> {
        self.state.error = None;
        let TodoId::Identified(raw) = id else {
            self.state.editing = None;
            return self.fail(Operation::Update, TodoError::MissingId { operation: Operation::Update });
        };
        let current = self.state.items.iter().find(|item| &item.id == id).cloned();
        let Some(current) = current else {
            return self.fail(Operation::Update, TodoError::UnknownItem { id: raw.clone() });
        };
        let merged = current.apply(patch);
        if let Err(err) = self.repo.update(raw, &merged).await {
            return self.fail(Operation::Update, err);
        }
        let refreshed = self.fetch_all().await;
        self.state.editing = None;
        refreshed
    }

    pub async fn toggle_complete(&mut self, row: usize) -> Result<(), TodoError> {
        let Some(item) = self.state.items.get(row) else { return Ok(()) };
        let (id, completed) = (item.id.clone(), item.completed);
        if id == TodoId::Unidentified {
            self.state.error = None;
            return self.fail(Operation::Update, TodoError::MissingId { operation: Operation::Update });
        }
        self.update(&id, &TodoPatch::completed(!completed)).await
    }

    /// Viewing -> Editing with a copy of the row's text.
    pub fn begin_edit(&mut self, row: usize) {
        if let Some(item) = self.state.items.get(row) {
            if item.id == TodoId::Unidentified {
                tracing::warn!(row, "editing a todo without an id; it can only change locally");
            }
            self.state.editing = Some(EditSession { row, id: item.id.clone(), text: item.title.clone() });
        }
    }

    pub fn cancel_edit(&mut self) { self.state.editing = None; }

    /// Editing -> Saved. Blank text stays in edit mode with an error.
    pub async fn save_edit(&mut self) -> Result<(), TodoError> {
        let Some(session) = self.state.editing.clone() else { return Ok(()) };
        let title = session.text.trim();
        if title.is_empty() {
            self.state.error = None;
            return self.fail(Operation::Update, TodoError::EmptyTitle);
        }
        self.update(&session.id, &TodoPatch::title(title)).await
    }

    /// Deletes after the prompt says yes. Declining is not an error.
    pub async fn remove(&mut self, id: &TodoId, prompt: &mut dyn ConfirmPrompt) -> Result<(), TodoError> {
        let TodoId::Identified(raw) = id else {
            self.state.error = None;
            return self.fail(Operation::Delete, TodoError::MissingId { operation: Operation::Delete });
        };
        if !prompt.confirm("Delete this todo?") { return Ok(()); }
        self.state.error = None;
        if let Err(err) = self.repo.delete(raw).await {
            return self.fail(Operation::Delete, err);
        }
        self.fetch_all().await
    }

    pub async fn remove_row(&mut self, row: usize, prompt: &mut dyn ConfirmPrompt) -> Result<(), TodoError> {
        let Some(item) = self.state.items.get(row) else { return Ok(()) };
        let id = item.id.clone();
        self.remove(&id, prompt).await
    }
}
