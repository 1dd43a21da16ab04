#[cfg(test)]
mod tests {
    use super::super::todo_list::{ConfirmPrompt, TodoListClient};
    use crate::domain::{
        error::{Operation, TodoError},
        repository::TodoRepository,
        todo::{normalize_list, NewTodo, TodoId, TodoItem, TodoPatch},
    };
    use async_trait::async_trait;
    use http::StatusCode;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        List,
        Create(Value),
        Update(String, Value),
        Delete(String),
    }

    #[derive(Clone, Default)]
    struct InMemoryRepo {
        items: Arc<Mutex<Vec<Value>>>,
        calls: Arc<Mutex<Vec<Call>>>,
        reject: Arc<Mutex<Option<(Operation, StatusCode, String)>>>,
        next_id: Arc<Mutex<u32>>,
        gate: Arc<Mutex<Option<Arc<Notify>>>>,
    }

    impl InMemoryRepo {
        fn with(items: Vec<Value>) -> Self {
            let repo = Self::default();
            *repo.items.lock().unwrap() = items;
            repo
        }

        fn reject(&self, operation: Operation, status: StatusCode, body: &str) {
            *self.reject.lock().unwrap() = Some((operation, status, body.to_string()));
        }

        /// Holds every following `list` until the returned handle is notified.
        fn hold_list(&self) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            *self.gate.lock().unwrap() = Some(gate.clone());
            gate
        }

        fn calls(&self) -> Vec<Call> { self.calls.lock().unwrap().clone() }

        fn check(&self, operation: Operation) -> Result<(), TodoError> {
            let mut reject = self.reject.lock().unwrap();
            match reject.take() {
                Some((op, status, body)) if op == operation => Err(TodoError::from_response(op, status, &body)),
                other => { *reject = other; Ok(()) }
            }
        }
    }

    #[async_trait]
    impl TodoRepository for InMemoryRepo {
        async fn list(&self) -> Result<Vec<TodoItem>, TodoError> {
            self.calls.lock().unwrap().push(Call::List);
            let gate = self.gate.lock().unwrap().clone();
            if let Some(gate) = gate { gate.notified().await; }
            self.check(Operation::List)?;
            Ok(normalize_list(&Value::Array(self.items.lock().unwrap().clone())))
        }
        async fn create(&self, input: &NewTodo) -> Result<(), TodoError> {
            let body = serde_json::to_value(input).unwrap();
            self.calls.lock().unwrap().push(Call::Create(body.clone()));
            self.check(Operation::Create)?;
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            let mut stored = body;
            stored["_id"] = json!(format!("new-{}", *next));
            self.items.lock().unwrap().push(stored);
            Ok(())
        }
        async fn update(&self, id: &str, item: &TodoItem) -> Result<(), TodoError> {
            let body = item.to_wire();
            self.calls.lock().unwrap().push(Call::Update(id.to_string(), body.clone()));
            self.check(Operation::Update)?;
            let mut items = self.items.lock().unwrap();
            if let Some(slot) = items.iter_mut().find(|v| v.get("_id").and_then(Value::as_str) == Some(id)) { *slot = body; }
            Ok(())
        }
        async fn delete(&self, id: &str) -> Result<(), TodoError> {
            self.calls.lock().unwrap().push(Call::Delete(id.to_string()));
            self.check(Operation::Delete)?;
            self.items.lock().unwrap().retain(|v| v.get("_id").and_then(Value::as_str) != Some(id));
            Ok(())
        }
    }

    struct Answer { reply: bool, asked: usize }

    impl ConfirmPrompt for Answer {
        fn confirm(&mut self, _question: &str) -> bool { self.asked += 1; self.reply }
    }

    async fn loaded(items: Vec<Value>) -> (InMemoryRepo, TodoListClient<InMemoryRepo>) {
        let repo = InMemoryRepo::with(items);
        let mut client = TodoListClient::new(repo.clone());
        client.fetch_all().await.unwrap();
        repo.calls.lock().unwrap().clear();
        (repo, client)
    }

    #[tokio::test]
    async fn unit_fetch_all_loads_items_in_remote_order() {
        let (_, client) = loaded(vec![json!({"_id": "2", "title": "B"}), json!({"_id": "1", "title": "A", "completed": false})]).await;
        let titles: Vec<_> = client.state().items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["B", "A"]);
        assert!(!client.state().items[1].completed);
        assert!(!client.state().loading);
        assert!(client.state().error.is_none());
    }

    #[tokio::test]
    async fn unit_fetch_failure_empties_list_and_retry_recovers() {
        let (repo, mut client) = loaded(vec![json!({"_id": "1", "title": "A"})]).await;
        repo.reject(Operation::List, StatusCode::INTERNAL_SERVER_ERROR, "");
        assert!(client.fetch_all().await.is_err());
        assert!(client.state().items.is_empty());
        assert_eq!(client.state().error.as_deref(), Some("server error (500)"));
        assert!(!client.state().loading);

        client.retry().await.unwrap();
        assert_eq!(client.state().items.len(), 1);
        assert!(client.state().error.is_none());
    }

    #[tokio::test]
    async fn unit_blank_create_is_a_no_op() {
        let (repo, mut client) = loaded(vec![json!({"_id": "1", "title": "A"})]).await;
        client.create("").await.unwrap();
        client.create("   ").await.unwrap();
        assert!(repo.calls().is_empty());
        assert_eq!(client.state().items.len(), 1);
    }

    #[tokio::test]
    async fn unit_create_posts_trimmed_text_then_refetches() {
        let (repo, mut client) = loaded(vec![]).await;
        client.draft_mut().push_str("  Buy milk ");
        client.submit_draft().await.unwrap();
        assert_eq!(repo.calls(), vec![
            Call::Create(json!({"title": "Buy milk", "text": "Buy milk", "completed": false})),
            Call::List,
        ]);
        assert_eq!(client.state().items[0].title, "Buy milk");
        assert!(client.state().draft.is_empty());
    }

    #[tokio::test]
    async fn unit_failed_create_keeps_draft() {
        let (repo, mut client) = loaded(vec![]).await;
        repo.reject(Operation::Create, StatusCode::BAD_REQUEST, r#"{"message":"title is required"}"#);
        client.draft_mut().push_str("Buy milk");
        let err = client.submit_draft().await.unwrap_err();
        assert!(matches!(err, TodoError::Http { status: StatusCode::BAD_REQUEST, .. }));
        assert_eq!(client.state().draft, "Buy milk");
        assert_eq!(client.state().error.as_deref(), Some("title is required"));
        assert_eq!(repo.calls().len(), 1);
    }

    #[tokio::test]
    async fn unit_update_without_id_never_reaches_repository() {
        let (repo, mut client) = loaded(vec![json!({"title": "orphan"})]).await;
        let err = client.update(&TodoId::Unidentified, &TodoPatch::title("x")).await.unwrap_err();
        assert!(matches!(err, TodoError::MissingId { operation: Operation::Update }));
        assert!(client.toggle_complete(0).await.is_err());
        assert!(repo.calls().is_empty());
        assert!(client.state().error.is_some());
    }

    #[tokio::test]
    async fn unit_toggle_complete_preserves_other_fields() {
        let (repo, mut client) = loaded(vec![json!({"_id": "1", "title": "A", "completed": false, "priority": 2})]).await;
        client.toggle_complete(0).await.unwrap();
        assert_eq!(repo.calls(), vec![
            Call::Update("1".into(), json!({"_id": "1", "title": "A", "text": "A", "completed": true, "priority": 2})),
            Call::List,
        ]);
        assert!(client.state().items[0].completed);
    }

    #[tokio::test]
    async fn unit_edit_cancel_and_save() {
        let (repo, mut client) = loaded(vec![json!({"_id": "1", "title": "A", "completed": true})]).await;
        client.begin_edit(0);
        assert!(client.state().is_editing(0));
        client.cancel_edit();
        assert!(client.state().editing.is_none());

        client.begin_edit(0);
        client.edit_text_mut().unwrap().clear();
        client.edit_text_mut().unwrap().push_str("  ");
        let err = client.save_edit().await.unwrap_err();
        assert!(matches!(err, TodoError::EmptyTitle));
        assert!(client.state().is_editing(0));
        assert!(repo.calls().is_empty());

        *client.edit_text_mut().unwrap() = " Renamed ".into();
        client.save_edit().await.unwrap();
        assert_eq!(repo.calls()[0], Call::Update("1".into(), json!({"_id": "1", "title": "Renamed", "text": "Renamed", "completed": true})));
        assert!(client.state().editing.is_none());
        assert_eq!(client.state().items[0].title, "Renamed");
        assert!(client.state().error.is_none());
    }

    #[tokio::test]
    async fn unit_unidentified_row_edits_locally_but_cannot_save() {
        let (repo, mut client) = loaded(vec![json!({"title": "first"}), json!({"title": "second"})]).await;
        client.begin_edit(1);
        assert!(client.state().is_editing(1));
        assert!(!client.state().is_editing(0));
        let err = client.save_edit().await.unwrap_err();
        assert!(err.is_local());
        assert!(client.state().editing.is_none());
        assert!(repo.calls().is_empty());
    }

    #[tokio::test]
    async fn unit_remove_requires_confirmation() {
        let (repo, mut client) = loaded(vec![json!({"_id": "1", "title": "A"}), json!({"_id": "2", "title": "B"})]).await;
        let mut no = Answer { reply: false, asked: 0 };
        client.remove_row(0, &mut no).await.unwrap();
        assert_eq!(no.asked, 1);
        assert!(repo.calls().is_empty());

        let mut yes = Answer { reply: true, asked: 0 };
        client.remove(&TodoId::from("1"), &mut yes).await.unwrap();
        assert_eq!(repo.calls(), vec![Call::Delete("1".into()), Call::List]);
        let titles: Vec<_> = client.state().items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["B"]);
    }

    #[tokio::test]
    async fn unit_remove_without_id_skips_prompt() {
        let (repo, mut client) = loaded(vec![json!({"title": "orphan"})]).await;
        let mut yes = Answer { reply: true, asked: 0 };
        let err = client.remove_row(0, &mut yes).await.unwrap_err();
        assert!(matches!(err, TodoError::MissingId { operation: Operation::Delete }));
        assert_eq!(yes.asked, 0);
        assert!(repo.calls().is_empty());
    }

    #[tokio::test]
    async fn unit_new_attempt_clears_previous_error() {
        let (repo, mut client) = loaded(vec![json!({"_id": "1", "title": "A"})]).await;
        repo.reject(Operation::Delete, StatusCode::NOT_FOUND, "Not found");
        let mut yes = Answer { reply: true, asked: 0 };
        assert!(client.remove_row(0, &mut yes).await.is_err());
        assert_eq!(client.state().error.as_deref(), Some("Not found"));

        client.toggle_complete(0).await.unwrap();
        assert!(client.state().error.is_none());
    }

    #[tokio::test]
    async fn unit_update_of_id_not_in_list_never_reaches_repository() {
        let (repo, mut client) = loaded(vec![]).await;
        let err = client.update(&TodoId::from("42"), &TodoPatch::completed(true)).await.unwrap_err();
        assert!(matches!(err, TodoError::UnknownItem { ref id } if id == "42"));
        assert!(err.is_local());
        assert!(repo.calls().is_empty());
        assert!(client.state().error.is_some());
    }

    #[tokio::test]
    async fn unit_loading_is_set_while_list_is_in_flight() {
        let (repo, mut client) = loaded(vec![json!({"_id": "1", "title": "A"})]).await;
        let gate = repo.hold_list();
        let pending = tokio::spawn(client.start_fetch());
        tokio::task::yield_now().await;
        assert_eq!(repo.calls(), vec![Call::List]);
        assert!(client.state().loading);
        assert!(!client.state().is_empty_view());

        gate.notify_one();
        let result = pending.await.unwrap();
        client.finish_fetch(result).unwrap();
        assert!(!client.state().loading);
        assert_eq!(client.state().items.len(), 1);
    }

    #[tokio::test]
    async fn unit_loading_is_cleared_after_failed_list() {
        let (repo, mut client) = loaded(vec![]).await;
        repo.reject(Operation::List, StatusCode::BAD_GATEWAY, "");
        let pending = client.start_fetch();
        assert!(client.state().loading);
        let result = pending.await;
        assert!(client.finish_fetch(result).is_err());
        assert!(!client.state().loading);
    }

    #[tokio::test]
    async fn unit_refetch_drops_edit_session_on_unidentified_row() {
        let (_, mut client) = loaded(vec![json!({"title": "first"}), json!({"title": "second"})]).await;
        client.begin_edit(1);
        client.retry().await.unwrap();
        assert!(client.state().editing.is_none());
        assert!(!client.state().is_editing(1));
    }

    #[tokio::test]
    async fn unit_refetch_keeps_edit_session_on_listed_id() {
        let (repo, mut client) = loaded(vec![json!({"_id": "1", "title": "A"}), json!({"_id": "2", "title": "B"})]).await;
        client.begin_edit(1);
        repo.items.lock().unwrap().reverse();
        client.retry().await.unwrap();
        assert!(client.state().is_editing(0));
        assert_eq!(client.state().editing.as_ref().unwrap().text, "B");

        repo.items.lock().unwrap().retain(|v| v["_id"] != "2");
        client.retry().await.unwrap();
        assert!(client.state().editing.is_none());
    }
}
