//! HTTP access client against mock access nodes.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use flow_tooling::blockchain::{
    AccessApi, Address, BlockchainError, CadenceValue, HttpAccessClient, SealPolicy, SealWaiter, TransactionStatus,
};
use flow_tooling::config::NetworkConfig;

mod common;
use common::{MockFlowNode, SERVICE_ADDRESS, SERVICE_KEY, TX_ID};

fn network(addr: std::net::SocketAddr) -> NetworkConfig {
    NetworkConfig {
        name: "mock".to_string(),
        access_url: format!("http://{}", addr),
        failover_urls: Vec::new(),
        rpc_timeout_secs: 5,
    }
}

#[tokio::test]
async fn test_get_account_and_block() {
    let node = Arc::new(MockFlowNode::new());
    let addr = common::start_mock_flow_node(node.clone()).await;
    let client = HttpAccessClient::new(&network(addr)).unwrap();

    let address: Address = SERVICE_ADDRESS.parse().unwrap();
    let account = client.get_account(&address).await.unwrap();
    assert_eq!(account.address, address);
    assert_eq!(account.balance, 100_000);
    let key = account.signing_key(&common::public_key(SERVICE_KEY)).unwrap();
    assert_eq!(key.sequence_number, 7);

    let block = client.get_latest_block_header(true).await.unwrap();
    assert_eq!(block.height, 42);
    assert!(client.is_healthy().await);

    let paths: Vec<String> = node.requests().into_iter().map(|r| r.path).collect();
    assert!(paths.contains(&format!("/v1/accounts/{}?expand=keys,contracts", SERVICE_ADDRESS)));
    assert!(paths.contains(&"/v1/blocks?height=sealed".to_string()));
}

#[tokio::test]
async fn test_unknown_account_is_not_found() {
    let node = Arc::new(MockFlowNode::new());
    let addr = common::start_mock_flow_node(node).await;
    let client = HttpAccessClient::new(&network(addr)).unwrap();

    let err = client.get_account(&"0x1234".parse().unwrap()).await.unwrap_err();
    match err {
        BlockchainError::NotFound(message) => assert_eq!(message, "account not found"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_script_arguments_and_result() {
    let node = Arc::new(
        MockFlowNode::new().with_script_result(serde_json::json!({ "type": "String", "value": "hello" })),
    );
    let addr = common::start_mock_flow_node(node.clone()).await;
    let client = HttpAccessClient::new(&network(addr)).unwrap();

    let value = client
        .execute_script_at_latest_block(b"access(all) fun main(n: UInt64): String { return \"hello\" }", &[
            CadenceValue::UInt64(9),
        ])
        .await
        .unwrap();
    assert_eq!(value, CadenceValue::String("hello".to_string()));

    let request = node.requests().pop().unwrap();
    assert_eq!(request.path, "/v1/scripts?block_height=sealed");
    let body = request.json();
    let argument = BASE64.decode(body["arguments"][0].as_str().unwrap()).unwrap();
    let argument: serde_json::Value = serde_json::from_slice(&argument).unwrap();
    assert_eq!(argument, serde_json::json!({ "type": "UInt64", "value": "9" }));
}

#[tokio::test]
async fn test_failover_on_server_error() {
    let primary_hits = Arc::new(AtomicU32::new(0));
    let hits = primary_hits.clone();
    let primary = common::start_programmable_backend(move |_request| {
        let hits = hits.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            (503, "{\"code\":503,\"message\":\"unavailable\"}".to_string())
        }
    })
    .await;

    let node = Arc::new(MockFlowNode::new());
    let secondary = common::start_mock_flow_node(node.clone()).await;

    let mut config = network(primary);
    config.failover_urls.push(format!("http://{}", secondary));
    let client = HttpAccessClient::new(&config).unwrap();

    let block = client.get_latest_block_header(true).await.unwrap();
    assert_eq!(block.height, 42);
    assert_eq!(primary_hits.load(Ordering::SeqCst), 1);
    assert_eq!(node.requests().len(), 1);
}

#[tokio::test]
async fn test_rejection_does_not_fail_over() {
    let primary = common::start_programmable_backend(|_request| async {
        (400, "{\"code\":400,\"message\":\"invalid script\"}".to_string())
    })
    .await;
    let node = Arc::new(MockFlowNode::new());
    let secondary = common::start_mock_flow_node(node.clone()).await;

    let mut config = network(primary);
    config.failover_urls.push(format!("http://{}", secondary));
    let client = HttpAccessClient::new(&config).unwrap();

    let err = client.execute_script_at_latest_block(b"bad", &[]).await.unwrap_err();
    assert!(matches!(err, BlockchainError::Rejected { status: 400, .. }));
    assert!(node.requests().is_empty());
}

#[tokio::test]
async fn test_seal_waiter_over_http() {
    let node = Arc::new(MockFlowNode::new().with_pending_polls(2));
    let addr = common::start_mock_flow_node(node.clone()).await;
    let client = HttpAccessClient::new(&network(addr)).unwrap();

    let waiter = SealWaiter::new(SealPolicy::unbounded(std::time::Duration::from_millis(10)));
    let result = waiter.wait(&client, &TX_ID.parse().unwrap()).await.unwrap();

    assert_eq!(result.status, TransactionStatus::Sealed);
    assert!(result.block_id.is_some());
    assert_eq!(node.result_polls(), 3);
}
