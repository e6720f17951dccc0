//! A local stand-in for the Bot API, for tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use {
    axum::{Json, Router, body::Bytes, extract::State, http::Uri, routing::post},
    serde::Deserialize,
    serde_json::{Value, json},
    tokio::{sync::oneshot, task::JoinHandle},
};

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub chat_id: i64,
    pub text: String,
    #[serde(default)]
    pub parse_mode: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Captured {
    SendMessage(SendMessageRequest),
    Other { method: String, raw_body: String },
}

#[derive(Clone, Default)]
struct ApiState {
    requests: Arc<Mutex<Vec<Captured>>>,
    admins: Arc<Mutex<Vec<u64>>>,
    fail_sends: Arc<AtomicBool>,
}

pub struct MockTelegramApi {
    state: ApiState,
    url: reqwest::Url,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<()>>,
}

impl MockTelegramApi {
    pub async fn start() -> Self {
        let state = ApiState::default();
        let app = Router::new()
            .route("/{*path}", post(handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve mock telegram api");
        });

        Self {
            state,
            url: reqwest::Url::parse(&format!("http://{addr}/")).expect("parse api url"),
            shutdown: Some(shutdown_tx),
            server: Some(server),
        }
    }

    pub fn bot(&self) -> teloxide::Bot {
        teloxide::Bot::new("test-token").set_api_url(self.url.clone())
    }

    pub fn set_admins(&self, ids: &[u64]) {
        *self.state.admins.lock().expect("admins lock") = ids.to_vec();
    }

    /// Answer every send with a Bot API error.
    pub fn fail_sends(&self) {
        self.state.fail_sends.store(true, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.state.requests.lock().expect("requests lock").clone()
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(server) = self.server.take() {
            server.await.expect("server join");
        }
    }
}

fn message_result(chat_id: i64) -> Value {
    json!({
        "message_id": 1,
        "date": 0,
        "chat": { "id": chat_id, "type": "private", "first_name": "Test" },
        "text": "ok"
    })
}

async fn handler(State(state): State<ApiState>, uri: Uri, body: Bytes) -> Json<Value> {
    let method = uri.path().rsplit('/').next().unwrap_or_default().to_string();
    let raw_body = String::from_utf8_lossy(&body).to_string();

    let captured = match method.as_str() {
        "SendMessage" => match serde_json::from_slice::<SendMessageRequest>(&body) {
            Ok(req) => Captured::SendMessage(req),
            Err(_) => Captured::Other {
                method: method.clone(),
                raw_body,
            },
        },
        _ => Captured::Other {
            method: method.clone(),
            raw_body,
        },
    };
    state.requests.lock().expect("lock requests").push(captured);

    let is_send = matches!(method.as_str(), "SendMessage" | "SendPhoto");
    if is_send && state.fail_sends.load(Ordering::SeqCst) {
        return Json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        }));
    }

    let result = match method.as_str() {
        "SendMessage" | "SendPhoto" => message_result(42),
        "GetChatAdministrators" => {
            let admins = state.admins.lock().expect("admins lock").clone();
            Value::Array(
                admins
                    .into_iter()
                    .map(|id| {
                        json!({
                            "status": "creator",
                            "user": { "id": id, "is_bot": false, "first_name": "Admin" },
                            "is_anonymous": false
                        })
                    })
                    .collect(),
            )
        },
        _ => Value::Bool(true),
    };
    Json(json!({ "ok": true, "result": result }))
}
