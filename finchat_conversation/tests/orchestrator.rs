//! End-to-end turns through the conversation manager with scripted backends.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use finchat_conversation::{
    ConversationConfig, ConversationManager, FAILURE_REPLY, IgnoreReason, SendOutcome, TurnState,
    UNEXPECTED_FORMAT_REPLY,
};
use finchat_core::{
    Account, Budget, ChatBackend, ChatReply, ChatRequest, Conversation, ConversationStorage,
    DEFAULT_SYSTEM_PROMPT, FinancialSnapshot, Role, Sender, SnapshotSource, Transaction,
};
use finchat_storage::{LocalConversationStorage, MemoryKeyValueStore};
use tokio::sync::{Mutex, Notify};

type Storage = Arc<LocalConversationStorage<MemoryKeyValueStore>>;

/// Backend that answers from a fixed script and records what it was sent.
#[derive(Default)]
struct ScriptedBackend {
    script: Mutex<VecDeque<anyhow::Result<ChatReply>>>,
    requests: Mutex<Vec<ChatRequest>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedBackend {
    fn new(script: Vec<anyhow::Result<ChatReply>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    fn gated(script: Vec<anyhow::Result<ChatReply>>, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(script)
        }
    }

    async fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn send(&self, request: &ChatRequest) -> anyhow::Result<ChatReply> {
        self.requests.lock().await.push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("script exhausted")))
    }
}

/// Storage whose writes always fail.
struct BrokenStorage;

#[async_trait]
impl ConversationStorage for BrokenStorage {
    async fn load(&self) -> Conversation {
        Conversation::default()
    }

    async fn save(&self, _conversation: &Conversation) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("disk full"))
    }
}

/// Snapshot source that counts how often it is asked.
struct CountingSource {
    snapshot: FinancialSnapshot,
    reads: AtomicUsize,
}

impl SnapshotSource for CountingSource {
    fn snapshot(&self) -> Option<FinancialSnapshot> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Some(self.snapshot.clone())
    }
}

fn reply(content: &str) -> anyhow::Result<ChatReply> {
    Ok(ChatReply {
        conversation_id: None,
        content: Some(content.to_string()),
    })
}

fn reply_with_id(content: &str, id: &str) -> anyhow::Result<ChatReply> {
    Ok(ChatReply {
        conversation_id: Some(id.to_string()),
        content: Some(content.to_string()),
    })
}

fn failure() -> anyhow::Result<ChatReply> {
    Err(anyhow::anyhow!("Server responded with status: 500"))
}

fn storage() -> Storage {
    Arc::new(LocalConversationStorage::new(MemoryKeyValueStore::new()))
}

fn transcript(messages: &[finchat_core::Message]) -> Vec<(Sender, String)> {
    messages
        .iter()
        .map(|m| (m.sender, m.content.clone()))
        .collect()
}

async fn new_manager(
    backend: Arc<ScriptedBackend>,
    storage: Storage,
) -> ConversationManager<Arc<ScriptedBackend>, Storage> {
    ConversationManager::new(backend, storage, ConversationConfig::default()).await
}

#[tokio::test]
async fn first_turn_without_personal_data() {
    let backend = Arc::new(ScriptedBackend::new(vec![reply("Hello!")]));
    let manager = new_manager(backend.clone(), storage()).await;

    let outcome = manager.send_message("Hi").await;

    assert!(matches!(&outcome, SendOutcome::Replied(m) if m.content == "Hello!"));
    assert_eq!(
        transcript(&manager.messages().await),
        [
            (Sender::User, "Hi".to_string()),
            (Sender::Assistant, "Hello!".to_string()),
        ]
    );

    let requests = backend.requests().await;
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.model, "gpt-3.5-turbo");
    assert_eq!(request.max_tokens, 1000);
    assert!(request.conversation_id.is_none());
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[0].role, Role::System);
    assert_eq!(request.messages[0].content, DEFAULT_SYSTEM_PROMPT);
    assert_eq!(request.messages[1].role, Role::User);
    assert_eq!(request.messages[1].content, "Hi");
}

#[tokio::test]
async fn transport_failure_appends_apology_and_returns_to_idle() {
    let backend = Arc::new(ScriptedBackend::new(vec![failure()]));
    let manager = new_manager(backend, storage()).await;

    let outcome = manager.send_message("Hi").await;

    assert!(matches!(outcome, SendOutcome::Failed(_)));
    assert_eq!(manager.state(), TurnState::Idle);
    assert_eq!(
        transcript(&manager.messages().await),
        [
            (Sender::User, "Hi".to_string()),
            (Sender::Assistant, FAILURE_REPLY.to_string()),
        ]
    );
}

#[tokio::test]
async fn unexpected_shape_appends_format_notice() {
    let backend = Arc::new(ScriptedBackend::new(vec![Ok(ChatReply::default())]));
    let manager = new_manager(backend, storage()).await;

    let outcome = manager.send_message("Hi").await;

    assert!(matches!(outcome, SendOutcome::UnexpectedFormat(_)));
    assert_eq!(manager.state(), TurnState::Idle);
    let messages = manager.messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, UNEXPECTED_FORMAT_REPLY);
}

#[tokio::test]
async fn empty_input_is_ignored() {
    let backend = Arc::new(ScriptedBackend::new(vec![]));
    let manager = new_manager(backend.clone(), storage()).await;

    assert_eq!(
        manager.send_message("   \n\t").await,
        SendOutcome::Ignored(IgnoreReason::EmptyInput)
    );
    assert!(manager.messages().await.is_empty());
    assert!(backend.requests().await.is_empty());
}

#[tokio::test]
async fn input_is_trimmed() {
    let backend = Arc::new(ScriptedBackend::new(vec![reply("ok")]));
    let manager = new_manager(backend.clone(), storage()).await;

    manager.send_message("  what is my balance?  \n").await;

    assert_eq!(manager.messages().await[0].content, "what is my balance?");
    assert_eq!(
        backend.requests().await[0].messages[1].content,
        "what is my balance?"
    );
}

#[tokio::test]
async fn second_submission_while_sending_is_dropped() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(ScriptedBackend::gated(
        vec![reply("first answer")],
        gate.clone(),
    ));
    let manager = new_manager(backend.clone(), storage()).await;

    let first = manager.send_message("first");
    let second = async {
        tokio::task::yield_now().await;
        assert_eq!(manager.state(), TurnState::Sending);
        let outcome = manager.send_message("second").await;
        assert_eq!(manager.messages().await.len(), 1);
        gate.notify_one();
        outcome
    };

    let (first, second) = tokio::join!(first, second);

    assert!(matches!(first, SendOutcome::Replied(_)));
    assert_eq!(second, SendOutcome::Ignored(IgnoreReason::Busy));
    assert_eq!(manager.state(), TurnState::Idle);
    assert_eq!(backend.requests().await.len(), 1);
    assert_eq!(
        transcript(&manager.messages().await),
        [
            (Sender::User, "first".to_string()),
            (Sender::Assistant, "first answer".to_string()),
        ]
    );
}

#[tokio::test]
async fn history_is_sent_in_order_before_new_turn() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        reply("one"),
        failure(),
        reply("three"),
    ]));
    let manager = new_manager(backend.clone(), storage()).await;

    manager.send_message("q1").await;
    manager.send_message("q2").await;
    manager.send_message("q3").await;

    assert_eq!(
        transcript(&manager.messages().await),
        [
            (Sender::User, "q1".to_string()),
            (Sender::Assistant, "one".to_string()),
            (Sender::User, "q2".to_string()),
            (Sender::Assistant, FAILURE_REPLY.to_string()),
            (Sender::User, "q3".to_string()),
            (Sender::Assistant, "three".to_string()),
        ]
    );

    let requests = backend.requests().await;
    let third: Vec<(Role, &str)> = requests[2]
        .messages
        .iter()
        .map(|m| (m.role, m.content.as_str()))
        .collect();
    assert_eq!(
        third,
        [
            (Role::System, DEFAULT_SYSTEM_PROMPT),
            (Role::User, "q1"),
            (Role::Assistant, "one"),
            (Role::User, "q2"),
            (Role::Assistant, FAILURE_REPLY),
            (Role::User, "q3"),
        ]
    );
}

#[tokio::test]
async fn conversation_id_is_set_once_and_reused() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        reply_with_id("a", "conv-1"),
        reply_with_id("b", "conv-2"),
        failure(),
        reply("d"),
    ]));
    let storage = storage();
    let manager = new_manager(backend.clone(), storage.clone()).await;

    for text in ["one", "two", "three", "four"] {
        manager.send_message(text).await;
        assert_eq!(manager.conversation_id().await.as_deref(), Some("conv-1"));
    }

    let sent_ids: Vec<Option<String>> = backend
        .requests()
        .await
        .into_iter()
        .map(|r| r.conversation_id)
        .collect();
    assert_eq!(
        sent_ids,
        [
            None,
            Some("conv-1".to_string()),
            Some("conv-1".to_string()),
            Some("conv-1".to_string()),
        ]
    );
    assert_eq!(
        storage.load().await.conversation_id.as_deref(),
        Some("conv-1")
    );
}

#[tokio::test]
async fn conversation_resumes_after_restart() {
    let storage = storage();
    {
        let backend = Arc::new(ScriptedBackend::new(vec![reply_with_id("Hello!", "conv-1")]));
        let manager = new_manager(backend, storage.clone()).await;
        manager.send_message("Hi").await;
    }

    let backend = Arc::new(ScriptedBackend::new(vec![reply("Welcome back")]));
    let manager = new_manager(backend.clone(), storage.clone()).await;

    assert_eq!(manager.messages().await.len(), 2);
    assert_eq!(manager.conversation_id().await.as_deref(), Some("conv-1"));

    manager.send_message("Still there?").await;

    let request = &backend.requests().await[0];
    assert_eq!(request.conversation_id.as_deref(), Some("conv-1"));
    assert_eq!(request.messages.len(), 4);
    assert_eq!(request.messages[1].content, "Hi");
    assert_eq!(request.messages[2].content, "Hello!");
    assert_eq!(storage.load().await.messages.len(), 4);
}

#[tokio::test]
async fn personal_data_flag_gates_snapshot() {
    let source = Arc::new(CountingSource {
        snapshot: FinancialSnapshot {
            accounts: vec![Account {
                balance: Some(12_345),
            }],
            budgets: vec![Budget {
                name: Some("Rent".to_string()),
            }],
            transactions: vec![Transaction {
                date: Some("2026-10-17".to_string()),
                payee: Some("Landlord".to_string()),
                amount: Some(-150_000),
            }],
        },
        reads: AtomicUsize::new(0),
    });
    let backend = Arc::new(ScriptedBackend::new(vec![reply("a"), reply("b")]));
    let manager = new_manager(backend.clone(), storage())
        .await
        .with_snapshot_source(source.clone());

    manager.send_message("without data").await;
    assert_eq!(source.reads.load(Ordering::SeqCst), 0);

    manager.set_include_personal_data(true);
    manager.send_message("with data").await;
    assert_eq!(source.reads.load(Ordering::SeqCst), 1);

    let requests = backend.requests().await;
    assert_eq!(requests[0].messages[0].content, DEFAULT_SYSTEM_PROMPT);

    let prompt = &requests[1].messages[0].content;
    assert!(prompt.starts_with(DEFAULT_SYSTEM_PROMPT));
    assert!(prompt.contains("The user has 1 accounts with a total combined balance of 123.45."));
    assert!(prompt.contains("budget categories: Rent."));
    assert!(prompt.contains("2026-10-17: Landlord - $-1500.00"));
}

#[tokio::test]
async fn personal_data_from_config_without_source() {
    let backend = Arc::new(ScriptedBackend::new(vec![reply("a")]));
    let manager = ConversationManager::new(
        backend.clone(),
        storage(),
        ConversationConfig::default().with_personal_data(true),
    )
    .await;

    assert!(manager.include_personal_data());
    manager.send_message("hello").await;

    let prompt = &backend.requests().await[0].messages[0].content;
    assert!(prompt.contains("The user has 0 accounts"));
    assert!(prompt.contains("No budget data available."));
    assert!(prompt.contains("No recent transactions."));
}

#[tokio::test]
async fn failing_storage_does_not_break_turns() {
    let backend = Arc::new(ScriptedBackend::new(vec![reply("still here")]));
    let manager =
        ConversationManager::new(backend, BrokenStorage, ConversationConfig::default()).await;

    let outcome = manager.send_message("Hi").await;

    assert!(matches!(outcome, SendOutcome::Replied(_)));
    assert_eq!(manager.messages().await.len(), 2);
    assert_eq!(manager.state(), TurnState::Idle);
}
