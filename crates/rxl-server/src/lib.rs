//! HTTP request handler for the Rx Ledger.
//!
//! Validates submitted transactions into record payloads, appends them to
//! the ledger, and serves the chain, per-drug history, and integrity reports
//! as JSON. The server owns the single [`rxl_ledger::Ledger`] handle and
//! serializes every call to it through one mutex.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::{ServerConfig, StoreConfig, StoreFormat};
pub use error::{ServerError, ServerResult};
pub use handler::TransactionForm;
pub use server::RxlServer;
pub use state::{AppState, SharedLedger};

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use rxl_ledger::Ledger;
    use rxl_store::{ChainStore, InMemoryChainStore};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn app() -> (AppState, Router) {
        let store: Box<dyn ChainStore> = Box::new(InMemoryChainStore::new());
        let state = AppState::new(Ledger::open(store).unwrap());
        let router = router::build_router(state.clone());
        (state, router)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn transaction(drug_id: &str, action: &str) -> Value {
        json!({ "drug_id": drug_id, "action": action, "manufacturer": "Acme" })
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (_, app) = app();
        let (status, body) = send(&app, get("/v1/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn info_endpoint() {
        let (_, app) = app();
        let (status, body) = send(&app, get("/v1/info")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["blocks"], 1);
        assert_eq!(body["store"], "memory");
    }

    #[tokio::test]
    async fn add_transaction_appends_block() {
        let (state, app) = app();
        let (status, body) = send(
            &app,
            post_json("/v1/transactions", transaction("D1", "manufactured")),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["index"], 1);
        assert_eq!(body["data"]["drug_id"], "D1");

        let ledger = state.ledger.lock().await;
        assert_eq!(ledger.len(), 2);
        assert_eq!(body["previous_hash"], ledger.chain()[0].hash.to_hex());
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let (state, app) = app();
        let (status, body) = send(
            &app,
            post_json("/v1/transactions", json!({ "drug_id": "D1", "action": "" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields");
        assert_eq!(body["missing"], json!(["action", "manufacturer"]));
        assert_eq!(state.ledger.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn list_and_get_transactions() {
        let (_, app) = app();
        send(&app, post_json("/v1/transactions", transaction("D1", "manufactured"))).await;
        send(&app, post_json("/v1/transactions", transaction("D1", "shipped"))).await;

        let (status, body) = send(&app, get("/v1/transactions")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
        assert_eq!(body[0]["data"], "Genesis Block");
        assert_eq!(body[0]["previous_hash"], "0");

        let (status, body) = send(&app, get("/v1/transactions/2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["action"], "shipped");

        let (status, body) = send(&app, get("/v1/transactions/9")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "block not found: 9");
    }

    #[tokio::test]
    async fn verify_reports_valid_chain() {
        let (_, app) = app();
        send(&app, post_json("/v1/transactions", transaction("D1", "manufactured"))).await;

        let (status, body) = send(&app, get("/v1/verify")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], true);
        assert_eq!(body["message"], "All transactions are valid");
        assert!(body["failure"].is_null());
        assert_eq!(body["report"]["block_count"], 2);
    }

    #[tokio::test]
    async fn verify_reports_tampering() {
        let (state, app) = app();
        send(&app, post_json("/v1/transactions", transaction("D1", "manufactured"))).await;

        {
            let mut ledger = state.ledger.lock().await;
            let mut chain = ledger.chain().to_vec();
            chain[1].data = rxl_types::Payload::record([("drug_id", "D1"), ("action", "forged")]);
            ledger.store().save(&chain).unwrap();
            assert!(ledger.reload().unwrap());
        }

        let (_, body) = send(&app, get("/v1/verify")).await;
        assert_eq!(body["valid"], false);
        assert_eq!(body["message"], "Blockchain integrity check failed!");
        assert!(body["failure"].as_str().unwrap().contains("index 1"));
        assert_eq!(body["report"]["violations"][0]["kind"], "hash_mismatch");
    }

    #[tokio::test]
    async fn drug_history_and_listing() {
        let (_, app) = app();
        send(&app, post_json("/v1/transactions", transaction("D1", "manufactured"))).await;
        send(&app, post_json("/v1/transactions", transaction("D2", "manufactured"))).await;
        send(&app, post_json("/v1/transactions", transaction("D1", "dispensed"))).await;

        let (status, body) = send(&app, get("/v1/drugs/D1/history")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["drug_id"], "D1");
        let actions: Vec<_> = body["transactions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["data"]["action"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(actions, vec!["manufactured", "dispensed"]);

        let (_, body) = send(&app, get("/v1/drugs")).await;
        assert_eq!(body, json!(["D1", "D2"]));

        let (status, body) = send(&app, get("/v1/drugs/unknown/history")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["transactions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn verify_covers_genesis() {
        let (state, app) = app();
        send(&app, post_json("/v1/transactions", transaction("D1", "manufactured"))).await;

        {
            let mut ledger = state.ledger.lock().await;
            let mut chain = ledger.chain().to_vec();
            chain[0].data = rxl_types::Payload::Text("Rewritten Genesis".into());
            ledger.store().save(&chain).unwrap();
            assert!(ledger.reload().unwrap());
        }

        let (_, body) = send(&app, get("/v1/verify")).await;
        assert_eq!(body["valid"], false);
        assert_eq!(body["report"]["hash_chain_valid"], false);
        assert!(body["failure"].as_str().unwrap().starts_with("index 0"));
    }
}
