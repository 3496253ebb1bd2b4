//! Shared utilities for integration testing.
//!
//! [`MockFlowNode`] speaks just enough of the Flow REST access API for the
//! tooling to create accounts, send transactions and run scripts against it.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use flow_tooling::blockchain::AccountRecord;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const SERVICE_ADDRESS: &str = "f8d6e0586b0a20c7";
pub const SERVICE_KEY: &str = "4d9287571c8bff7482ffc27ef68d5b4990f9bd009a1e9fa812aae08ba167d57f";
pub const USER_ADDRESS: &str = "01cf0e2f2f715450";
pub const USER_KEY: &str = "68ee617d9bf67a4677af80aaca5a090fcda80ff2f4dbc340e0e36201fa1f1d8c";
pub const TX_ID: &str = "b1a8e2d6f9c3e4a5b6c7d8e9f0a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6e7f8a9";
pub const BLOCK_ID: &str = "7bc42fe85d32ca513769a74f97f7e1a7bad6c9407f0d934c2aa645ef9cf613c7";

/// Hex public key for a test private key, as the node reports it.
pub fn public_key(private_key: &str) -> String {
    let record: AccountRecord =
        serde_json::from_value(json!({ "address": SERVICE_ADDRESS, "privateKey": private_key })).unwrap();
    record.signer().unwrap().public_key_hex()
}

/// A request as seen by a mock server.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

impl MockRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    Some(MockRequest { method, path, body })
}

/// Start a programmable HTTP backend on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(MockRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(request).await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// State behind a mock access node.
pub struct MockFlowNode {
    /// Address (hex, no prefix) to public key and sequence number.
    accounts: HashMap<String, (String, u64)>,
    /// Status lookups answered with `Pending` before `Sealed`.
    pending_polls: u32,
    /// Events reported with the sealed result.
    events: Vec<Value>,
    error_message: String,
    script_result: Value,
    result_polls: AtomicU32,
    requests: Mutex<Vec<MockRequest>>,
}

impl MockFlowNode {
    pub fn new() -> Self {
        let mut accounts = HashMap::new();
        accounts.insert(SERVICE_ADDRESS.to_string(), (public_key(SERVICE_KEY), 7));
        accounts.insert(USER_ADDRESS.to_string(), (public_key(USER_KEY), 0));
        Self {
            accounts,
            pending_polls: 0,
            events: Vec::new(),
            error_message: String::new(),
            script_result: json!({ "type": "Int", "value": "42" }),
            result_polls: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_pending_polls(mut self, polls: u32) -> Self {
        self.pending_polls = polls;
        self
    }

    #[allow(dead_code)]
    pub fn with_account_created(mut self, address: &str) -> Self {
        let payload = json!({
            "type": "Event",
            "value": {
                "id": "flow.AccountCreated",
                "fields": [{ "name": "address", "value": { "type": "Address", "value": format!("0x{}", address) } }]
            }
        });
        self.events.push(json!({
            "type": "flow.AccountCreated",
            "transaction_id": TX_ID,
            "transaction_index": "0",
            "event_index": self.events.len().to_string(),
            "payload": BASE64.encode(payload.to_string()),
        }));
        self
    }

    #[allow(dead_code)]
    pub fn with_execution_error(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    #[allow(dead_code)]
    pub fn with_script_result(mut self, value: Value) -> Self {
        self.script_result = value;
        self
    }

    pub fn result_polls(&self) -> u32 {
        self.result_polls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Bodies of submitted transactions.
    #[allow(dead_code)]
    pub fn sent_transactions(&self) -> Vec<Value> {
        self.requests()
            .iter()
            .filter(|r| r.method == "POST" && r.path == "/v1/transactions")
            .map(MockRequest::json)
            .collect()
    }

    fn account(&self, address: &str) -> (u16, String) {
        let Some((public_key, sequence_number)) = self.accounts.get(address) else {
            return (404, json!({ "code": 404, "message": "account not found" }).to_string());
        };
        let body = json!({
            "address": address,
            "balance": "100000",
            "keys": [{
                "index": "0",
                "public_key": format!("0x{}", public_key),
                "signing_algorithm": "ECDSA_P256",
                "hashing_algorithm": "SHA3_256",
                "sequence_number": sequence_number.to_string(),
                "weight": "1000",
                "revoked": false
            }],
            "contracts": {}
        });
        (200, body.to_string())
    }

    fn transaction_result(&self) -> (u16, String) {
        let poll = self.result_polls.fetch_add(1, Ordering::SeqCst);
        if poll < self.pending_polls {
            let body = json!({ "block_id": "", "status": "Pending", "status_code": 0, "events": [] });
            return (200, body.to_string());
        }

        let status_code = u32::from(!self.error_message.is_empty());
        let body = json!({
            "block_id": BLOCK_ID,
            "status": "Sealed",
            "status_code": status_code,
            "error_message": self.error_message,
            "computation_used": "12",
            "events": self.events,
        });
        (200, body.to_string())
    }

    fn handle(&self, request: MockRequest) -> (u16, String) {
        self.requests.lock().unwrap().push(request.clone());
        let path = request.path.as_str();

        match request.method.as_str() {
            "GET" if path.starts_with("/v1/blocks") => {
                let body = json!([{
                    "header": { "id": BLOCK_ID, "parent_id": BLOCK_ID, "height": "42" }
                }]);
                (200, body.to_string())
            }
            "GET" if path.starts_with("/v1/accounts/") => {
                let address = path["/v1/accounts/".len()..].split('?').next().unwrap_or_default();
                self.account(address)
            }
            "GET" if path.starts_with("/v1/transaction_results/") => self.transaction_result(),
            "POST" if path == "/v1/transactions" => (200, json!({ "id": TX_ID }).to_string()),
            "POST" if path.starts_with("/v1/scripts") => {
                (200, Value::String(BASE64.encode(self.script_result.to_string())).to_string())
            }
            _ => (404, json!({ "code": 404, "message": "no such route" }).to_string()),
        }
    }
}

/// Serve `node` on an ephemeral port.
pub async fn start_mock_flow_node(node: Arc<MockFlowNode>) -> SocketAddr {
    start_programmable_backend(move |request| {
        let node = node.clone();
        async move { node.handle(request) }
    })
    .await
}

/// Lay out a project: flow.json, wallet.json and the Cadence directories.
#[allow(dead_code)]
pub fn write_project(root: &Path) {
    let flow = json!({
        "accounts": {
            "service": {
                "address": SERVICE_ADDRESS,
                "privateKey": SERVICE_KEY,
                "sigAlgorithm": "ECDSA_P256",
                "hashAlgorithm": "SHA3_256"
            }
        }
    });
    let wallet = json!({
        "accounts": {
            "nft": {
                "address": USER_ADDRESS,
                "privateKey": USER_KEY,
                "sigAlgorithm": "ECDSA_P256",
                "hashAlgorithm": "SHA3_256"
            }
        }
    });
    std::fs::write(root.join("flow.json"), flow.to_string()).unwrap();
    std::fs::write(root.join("wallet.json"), wallet.to_string()).unwrap();
    for dir in ["contracts", "transactions", "scripts"] {
        std::fs::create_dir_all(root.join(dir)).unwrap();
    }
}
