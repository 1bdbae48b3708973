//! Protocol dispatcher.
//!
//! | type        | effect                                 | reply           |
//! |-------------|----------------------------------------|-----------------|
//! | `ping`      | none                                   | `pong`          |
//! | `hello`     | stores the declared name               | `hello_ack`     |
//! | `set`       | writes the shared state store          | `set_ack`       |
//! | `get`       | reads the shared state store           | `get_ack`       |
//! | `broadcast` | relays a `signal` to every other peer  | `broadcast_ack` |
//! | other       | logged                                 | `ack`           |

use std::sync::Arc;

use fieldlink_shared::time::Clock;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    domain::Record,
    infrastructure::{ClientRegistry, Connection, ErrorCode, ServerRecord, SharedStateStore},
};

use super::RequestError;

pub struct Dispatcher {
    registry: Arc<ClientRegistry>,
    state: Arc<SharedStateStore>,
    clock: Arc<dyn Clock>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ClientRegistry>,
        state: Arc<SharedStateStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            state,
            clock,
        }
    }

    /// Act on one record from `connection` and build the reply.
    pub async fn handle(&self, connection: &Connection, record: Record) -> ServerRecord {
        let msg_type = record
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let req_id = record.get("id").cloned().unwrap_or(Value::Null);

        debug!(id = %connection.id(), msg_type = %msg_type, "dispatching record");

        let result = match msg_type.as_str() {
            "ping" => Ok(ServerRecord::Pong {
                id: req_id.clone(),
                ts: self.now(),
            }),
            "hello" => Ok(self.hello(connection, &record, req_id.clone()).await),
            "set" => self.set(&record, req_id.clone()).await,
            "get" => self.get(&record, req_id.clone()).await,
            "broadcast" => self.broadcast(connection, &record, req_id.clone()).await,
            _ => {
                let name = connection.name().await;
                let msg = Value::Object(record);
                info!(
                    id = %connection.id(),
                    name = %name,
                    msg_type = %msg_type,
                    msg = %msg,
                    "message from client"
                );
                Ok(ServerRecord::Ack {
                    id: req_id.clone(),
                    received_type: msg_type.clone(),
                    ts: self.now(),
                })
            }
        };

        result.unwrap_or_else(|e| {
            debug!(id = %connection.id(), error = %e, "rejecting request");
            ServerRecord::Error {
                id: req_id,
                code: ErrorCode::BadRequest,
                details: e.to_string(),
                ts: self.now(),
            }
        })
    }

    async fn hello(&self, connection: &Connection, record: &Record, req_id: Value) -> ServerRecord {
        if let Some(name) = record.get("name").and_then(Value::as_str) {
            connection.set_name(name.to_string()).await;
        }
        ServerRecord::HelloAck {
            id: req_id,
            client_id: connection.id().clone(),
            ts: self.now(),
        }
    }

    async fn set(&self, record: &Record, req_id: Value) -> Result<ServerRecord, RequestError> {
        let key = required_key(record)?;
        let value = record.get("value").cloned().unwrap_or(Value::Null);
        self.state.set(key.clone(), value).await;
        Ok(ServerRecord::SetAck {
            id: req_id,
            key,
            ts: self.now(),
        })
    }

    async fn get(&self, record: &Record, req_id: Value) -> Result<ServerRecord, RequestError> {
        let key = required_key(record)?;
        let value = self.state.get(&key).await.unwrap_or(Value::Null);
        Ok(ServerRecord::GetAck {
            id: req_id,
            key,
            value,
            ts: self.now(),
        })
    }

    async fn broadcast(
        &self,
        connection: &Connection,
        record: &Record,
        req_id: Value,
    ) -> Result<ServerRecord, RequestError> {
        let payload = match record.get("payload") {
            Some(Value::Object(payload)) => payload.clone(),
            _ => return Err(RequestError::PayloadNotObject),
        };

        let signal = ServerRecord::Signal {
            from: connection.id().clone(),
            payload,
            ts: self.now(),
        };
        let sent = self
            .registry
            .broadcast(&signal, Some(connection.id()))
            .await;

        Ok(ServerRecord::BroadcastAck {
            id: req_id,
            sent,
            ts: self.now(),
        })
    }

    fn now(&self) -> i64 {
        self.clock.now_millis()
    }
}

fn required_key(record: &Record) -> Result<String, RequestError> {
    match record.get("key") {
        Some(Value::String(key)) if !key.is_empty() => Ok(key.clone()),
        _ => Err(RequestError::KeyRequired),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::infrastructure::connection::test_support::{connection, fixed_clock};

    const NOW: i64 = 1_700_000_000_000;

    struct Fixture {
        dispatcher: Dispatcher,
        registry: Arc<ClientRegistry>,
        state: Arc<SharedStateStore>,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(ClientRegistry::new());
        let state = Arc::new(SharedStateStore::new());
        let dispatcher = Dispatcher::new(registry.clone(), state.clone(), fixed_clock());
        Fixture {
            dispatcher,
            registry,
            state,
        }
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_ping_echoes_correlation_id() {
        // テスト項目: ping に対して相関 ID をそのまま返す pong が返される
        // given (前提条件):
        let f = fixture();
        let (conn, _peer) = connection("alpha", 5000);

        // when (操作):
        let reply = f
            .dispatcher
            .handle(&conn, record(json!({"type": "ping", "id": "42"})))
            .await;

        // then (期待する結果):
        assert_eq!(
            reply,
            ServerRecord::Pong {
                id: json!("42"),
                ts: NOW
            }
        );
    }

    #[tokio::test]
    async fn test_hello_stores_name_and_returns_connection_id() {
        // テスト項目: hello で名前が保存され、hello_ack に接続 ID が入る
        // given (前提条件):
        let f = fixture();
        let (conn, _peer) = connection("alpha", 5000);

        // when (操作):
        let reply = f
            .dispatcher
            .handle(&conn, record(json!({"type": "hello", "name": "x"})))
            .await;

        // then (期待する結果):
        assert_eq!(
            reply,
            ServerRecord::HelloAck {
                id: Value::Null,
                client_id: conn.id().clone(),
                ts: NOW
            }
        );
        assert_eq!(conn.name().await, "x");
    }

    #[tokio::test]
    async fn test_hello_with_non_string_name_keeps_previous_name() {
        // テスト項目: name が文字列でない hello は名前を変えずに ack を返す
        // given (前提条件):
        let f = fixture();
        let (conn, _peer) = connection("alpha", 5000);
        conn.set_name("keep".to_string()).await;

        // when (操作):
        let reply = f
            .dispatcher
            .handle(&conn, record(json!({"type": "hello", "name": 7})))
            .await;

        // then (期待する結果):
        assert!(matches!(reply, ServerRecord::HelloAck { .. }));
        assert_eq!(conn.name().await, "keep");
    }

    #[tokio::test]
    async fn test_set_then_get_roundtrip() {
        // テスト項目: set した値が get_ack で返される
        // given (前提条件):
        let f = fixture();
        let (conn, _peer) = connection("alpha", 5000);

        // when (操作):
        let set_reply = f
            .dispatcher
            .handle(
                &conn,
                record(json!({"type": "set", "id": 1, "key": "DO", "value": [1, 0, 0, 1]})),
            )
            .await;
        let get_reply = f
            .dispatcher
            .handle(&conn, record(json!({"type": "get", "id": 2, "key": "DO"})))
            .await;

        // then (期待する結果):
        assert_eq!(
            set_reply,
            ServerRecord::SetAck {
                id: json!(1),
                key: "DO".to_string(),
                ts: NOW
            }
        );
        assert_eq!(
            get_reply,
            ServerRecord::GetAck {
                id: json!(2),
                key: "DO".to_string(),
                value: json!([1, 0, 0, 1]),
                ts: NOW
            }
        );
        assert_eq!(f.state.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_missing_key_returns_null_value() {
        // テスト項目: 未設定のキーの get は value が null の get_ack になる
        // given (前提条件):
        let f = fixture();
        let (conn, _peer) = connection("alpha", 5000);

        // when (操作):
        let reply = f
            .dispatcher
            .handle(&conn, record(json!({"type": "get", "key": "missing"})))
            .await;

        // then (期待する結果):
        assert_eq!(
            reply,
            ServerRecord::GetAck {
                id: Value::Null,
                key: "missing".to_string(),
                value: Value::Null,
                ts: NOW
            }
        );
    }

    #[tokio::test]
    async fn test_set_without_key_is_bad_request() {
        // テスト項目: key が無い set は bad_request になり、状態は変わらない
        // given (前提条件):
        let f = fixture();
        let (conn, _peer) = connection("alpha", 5000);

        // when (操作):
        let reply = f
            .dispatcher
            .handle(&conn, record(json!({"type": "set", "id": "r", "value": 1})))
            .await;

        // then (期待する結果):
        assert_eq!(
            reply,
            ServerRecord::Error {
                id: json!("r"),
                code: ErrorCode::BadRequest,
                details: "key must be non-empty string".to_string(),
                ts: NOW
            }
        );
        assert!(f.state.is_empty().await);
    }

    #[tokio::test]
    async fn test_get_with_empty_or_mistyped_key_is_bad_request() {
        // テスト項目: 空文字や数値の key を持つ get は bad_request になる
        // given (前提条件):
        let f = fixture();
        let (conn, _peer) = connection("alpha", 5000);

        // when (操作):
        let empty = f
            .dispatcher
            .handle(&conn, record(json!({"type": "get", "key": ""})))
            .await;
        let number = f
            .dispatcher
            .handle(&conn, record(json!({"type": "get", "key": 3})))
            .await;

        // then (期待する結果):
        assert!(matches!(empty, ServerRecord::Error { code: ErrorCode::BadRequest, .. }));
        assert!(matches!(number, ServerRecord::Error { code: ErrorCode::BadRequest, .. }));
    }

    #[tokio::test]
    async fn test_broadcast_relays_signal_to_other_peers() {
        // テスト項目: broadcast は送信者以外に signal を届け、配信数を返す
        // given (前提条件):
        let f = fixture();
        let (a, _peer_a) = connection("a", 5001);
        let (b, mut peer_b) = connection("b", 5002);
        let (c, mut peer_c) = connection("c", 5003);
        for conn in [&a, &b, &c] {
            f.registry.add(conn.clone()).await;
        }

        // when (操作):
        let reply = f
            .dispatcher
            .handle(
                &a,
                record(json!({"type": "broadcast", "id": 9, "payload": {"a": 1}})),
            )
            .await;

        // then (期待する結果):
        assert_eq!(
            reply,
            ServerRecord::BroadcastAck {
                id: json!(9),
                sent: 2,
                ts: NOW
            }
        );
        let expected = json!({"type": "signal", "from": "a", "payload": {"a": 1}, "ts": NOW});
        assert_eq!(peer_b.read_value().await, expected);
        assert_eq!(peer_c.read_value().await, expected);
    }

    #[tokio::test]
    async fn test_broadcast_with_non_object_payload_is_bad_request() {
        // テスト項目: payload がオブジェクトでない broadcast は bad_request になる
        // given (前提条件):
        let f = fixture();
        let (a, _peer_a) = connection("a", 5001);

        // when (操作):
        let reply = f
            .dispatcher
            .handle(&a, record(json!({"type": "broadcast", "payload": [1, 2]})))
            .await;

        // then (期待する結果):
        assert_eq!(
            reply,
            ServerRecord::Error {
                id: Value::Null,
                code: ErrorCode::BadRequest,
                details: "payload must be JSON object".to_string(),
                ts: NOW
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_type_gets_generic_ack() {
        // テスト項目: 未知の type には受信した type を含む ack が返される
        // given (前提条件):
        let f = fixture();
        let (conn, _peer) = connection("alpha", 5000);

        // when (操作):
        let status = f
            .dispatcher
            .handle(&conn, record(json!({"type": "status", "id": "s", "DI": [1, 0]})))
            .await;
        let untyped = f.dispatcher.handle(&conn, record(json!({"DI": [1]}))).await;

        // then (期待する結果):
        assert_eq!(
            status,
            ServerRecord::Ack {
                id: json!("s"),
                received_type: "status".to_string(),
                ts: NOW
            }
        );
        assert_eq!(
            untyped,
            ServerRecord::Ack {
                id: Value::Null,
                received_type: String::new(),
                ts: NOW
            }
        );
    }
}
