//! Test doubles shared by the unit tests.
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::State,
    http::{
        HeaderMap, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::post,
};
use records::Notification;
use serde_json::Value;
use tokio::{net::TcpListener, sync::Mutex};

use crate::{
    counter::RecordCounter,
    database::{Fields, Filter, MemoryStore, RecordStore},
    error::{StoreError, TransportError},
    ids::IdGenerator,
    notify::{Dispatcher, LogOnly, Sent, Transport},
    services::Context,
};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub body: Value,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
}

type Shared = (Arc<Mutex<Vec<Recorded>>>, StatusCode);

/// HTTP endpoint on a random local port that records every POST to `/`.
pub struct Recorder {
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl Recorder {
    pub async fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().await.clone()
    }
}

pub async fn recorder(status: StatusCode) -> Recorder {
    let requests = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new()
        .route("/", post(record))
        .with_state((requests.clone(), status));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    Recorder {
        url: format!("http://{address}/"),
        requests,
    }
}

async fn record(
    State((requests, status)): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    let header = |name| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    requests.lock().await.push(Recorded {
        body,
        content_type: header(CONTENT_TYPE),
        authorization: header(AUTHORIZATION),
    });

    status
}

/// Store whose every call fails.
pub struct BrokenStore;

fn offline() -> StoreError {
    StoreError::Redis(redis::RedisError::from((
        redis::ErrorKind::IoError,
        "store offline",
    )))
}

#[async_trait]
impl RecordStore for BrokenStore {
    async fn list(&self, _table: &str, _filter: &Filter) -> Result<Vec<Fields>, StoreError> {
        Err(offline())
    }

    async fn get(&self, _table: &str, _id: &str) -> Result<Option<Fields>, StoreError> {
        Err(offline())
    }

    async fn create(&self, _table: &str, _fields: Fields) -> Result<Fields, StoreError> {
        Err(offline())
    }

    async fn update(&self, _table: &str, _id: &str, _fields: Fields) -> Result<Fields, StoreError> {
        Err(offline())
    }

    async fn delete(&self, _table: &str, _id: &str) -> Result<(), StoreError> {
        Err(offline())
    }
}

/// Transport that keeps every notification it is handed.
#[derive(Clone, Default)]
pub struct Captured {
    pub sent: Arc<Mutex<Vec<Notification>>>,
}

#[async_trait]
impl Transport for Captured {
    fn name(&self) -> &'static str {
        "captured"
    }

    async fn send(&self, notification: &Notification) -> Result<Sent, TransportError> {
        self.sent.lock().await.push(notification.clone());

        Ok(Sent {
            transport: self.name(),
        })
    }
}

/// Transport that refuses every notification, keeping what it was handed.
#[derive(Clone, Default)]
pub struct Refusing {
    pub tried: Arc<Mutex<Vec<Notification>>>,
}

#[async_trait]
impl Transport for Refusing {
    fn name(&self) -> &'static str {
        "refusing"
    }

    async fn send(&self, notification: &Notification) -> Result<Sent, TransportError> {
        self.tried.lock().await.push(notification.clone());

        Err(TransportError::Failed("endpoint responded with 500".to_string()))
    }
}

/// Memory store whose `fail_at`-th create in `table` (1-based) fails.
pub struct FailingCreate {
    inner: MemoryStore,
    table: &'static str,
    fail_at: usize,
    creates: AtomicUsize,
}

impl FailingCreate {
    pub fn new(table: &'static str, fail_at: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            table,
            fail_at,
            creates: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RecordStore for FailingCreate {
    async fn list(&self, table: &str, filter: &Filter) -> Result<Vec<Fields>, StoreError> {
        self.inner.list(table, filter).await
    }

    async fn get(&self, table: &str, id: &str) -> Result<Option<Fields>, StoreError> {
        self.inner.get(table, id).await
    }

    async fn create(&self, table: &str, fields: Fields) -> Result<Fields, StoreError> {
        if table == self.table && self.creates.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_at {
            return Err(offline());
        }

        self.inner.create(table, fields).await
    }

    async fn update(&self, table: &str, id: &str, fields: Fields) -> Result<Fields, StoreError> {
        self.inner.update(table, id, fields).await
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        self.inner.delete(table, id).await
    }
}

/// Service context over `store`, counting ids in the same store.
pub fn context_with(store: Arc<dyn RecordStore>, transports: Vec<Box<dyn Transport>>) -> Context {
    Context {
        store: store.clone(),
        ids: Arc::new(IdGenerator::new(Arc::new(RecordCounter::new(store)))),
        dispatcher: Arc::new(Dispatcher::new(transports)),
    }
}

/// Service context over a fresh memory store, delivering into `Captured`.
pub fn context() -> (Context, Captured) {
    let captured = Captured::default();

    let context = context_with(
        Arc::new(MemoryStore::new()),
        vec![Box::new(captured.clone()), Box::new(LogOnly)],
    );

    (context, captured)
}
