//! End-to-end turn: Foundry mock server, local SQLite snapshot.

use identity::StaticTokenCredential;
use rusqlite::Connection;
use runtime::{FoundryClient, Session, SqlToolHost, TurnObserver};
use serde_json::{Value, json};
use std::sync::Mutex;
use tempfile::TempDir;
use warehouse::SqliteWarehouse;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn snapshot(dir: &TempDir) -> SqliteWarehouse {
    let path = dir.path().join("lakehouse.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE sales (region TEXT, amount INTEGER);
         INSERT INTO sales VALUES ('East', 120), ('West', 80);",
    )
    .unwrap();
    SqliteWarehouse::open(&path).unwrap()
}

#[derive(Default)]
struct Queries(Mutex<Vec<String>>);

impl TurnObserver for Queries {
    fn on_function_call(&self, _name: &str, arguments: &Value) {
        let sql = arguments["sql_query"].as_str().unwrap_or_default();
        self.0.lock().unwrap().push(sql.to_string());
    }
}

#[tokio::test]
async fn resolves_sql_call_against_snapshot() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "conv_e2e"})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/openai/responses"))
        .and(body_partial_json(json!({
            "input": "Which region sold more?",
            "conversation": {"id": "conv_e2e"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "resp_1",
            "status": "completed",
            "output": [{
                "type": "function_call",
                "call_id": "call_sql",
                "name": "execute_sql",
                "arguments": "{\"sql_query\": \"SELECT region, amount FROM sales ORDER BY amount DESC\"}"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let table = "| region | amount |\n|---|---|\n| East | 120 |\n| West | 80 |\n\n(2 rows returned)";
    Mock::given(method("POST"))
        .and(path("/openai/responses"))
        .and(body_string_contains("function_call_output"))
        .and(body_partial_json(json!({
            "input": [{"type": "function_call_output", "call_id": "call_sql", "output": table}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "resp_2",
            "status": "completed",
            "output": [{
                "type": "message",
                "role": "assistant",
                "content": [{"type": "output_text", "text": "East sold more (120)."}]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = FoundryClient::builder(server.uri(), StaticTokenCredential::new("t"))
        .build()
        .unwrap();
    let agent = runtime::AgentDefinition {
        model: "gpt-4o".into(),
        instructions: "Use execute_sql.".into(),
        tools: vec![json!({"type": "function", "name": "execute_sql", "parameters": {}})],
    };
    let session = Session::start(client, SqlToolHost::new(snapshot(&dir)), agent)
        .await
        .unwrap();
    let queries = Queries::default();

    let answer = session
        .resolve_observed("Which region sold more?", &queries)
        .await
        .unwrap();

    assert_eq!(answer, "East sold more (120).");
    assert_eq!(session.conversation_id().as_str(), "conv_e2e");
    assert_eq!(
        queries.0.lock().unwrap().as_slice(),
        ["SELECT region, amount FROM sales ORDER BY amount DESC"]
    );
}
