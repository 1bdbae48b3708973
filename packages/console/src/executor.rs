//! Execution of parsed console commands against a [`DevicePusher`].

use fieldlink_server::domain::DevicePusher;
use tracing::info;

use crate::{
    command::{ConsoleCommand, do_record},
    formatter::ConsoleFormatter,
};

/// What the console should do after a command ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print the text and keep reading
    Print(String),
    /// Leave the console
    Exit,
}

/// Run one command and report what the console should do next.
pub async fn execute(command: ConsoleCommand, pusher: &dyn DevicePusher) -> Outcome {
    match command {
        ConsoleCommand::Broadcast(values) => {
            let record = do_record(&values);
            let sent = pusher.broadcast(&record, None).await;
            info!(sent, "operator broadcast DO");
            Outcome::Print(ConsoleFormatter::format_broadcast(&record, sent))
        }
        ConsoleCommand::Unicast { id, values } => {
            let record = do_record(&values);
            let delivered = pusher.send(&id, &record).await;
            info!(id = %id, delivered, "operator unicast DO");
            Outcome::Print(ConsoleFormatter::format_unicast(&record, &id, delivered))
        }
        ConsoleCommand::List => {
            let connections = pusher.connections().await;
            Outcome::Print(ConsoleFormatter::format_connections(&connections))
        }
        ConsoleCommand::Help => Outcome::Print(ConsoleFormatter::format_help()),
        ConsoleCommand::Exit => Outcome::Exit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fieldlink_server::domain::{ConnectionId, ConnectionInfo, Record};
    use mockall::mock;
    use serde_json::{Value, json};

    mock! {
        Pusher {}

        #[async_trait]
        impl DevicePusher for Pusher {
            async fn send(&self, id: &ConnectionId, payload: &Record) -> bool;
            async fn broadcast<'a, 'b, 'c>(&'a self, payload: &'b Record, exclude: Option<&'c ConnectionId>) -> usize;
            async fn connections(&self) -> Vec<ConnectionInfo>;
        }
    }

    #[tokio::test]
    async fn test_broadcast_pushes_do_record_to_everyone() {
        // テスト項目: broadcast コマンドが除外なしで DO レコードを配信する
        // given (前提条件):
        let mut pusher = MockPusher::new();
        pusher
            .expect_broadcast()
            .withf(|payload, exclude| {
                Value::Object(payload.clone()) == json!({"DO": [1, 0, 0, 1]}) && exclude.is_none()
            })
            .times(1)
            .return_const(2usize);

        // when (操作):
        let outcome = execute(ConsoleCommand::Broadcast(vec![1, 0, 0, 1]), &pusher).await;

        // then (期待する結果):
        assert_eq!(
            outcome,
            Outcome::Print("broadcast {\"DO\":[1,0,0,1]} to 2 device(s)\n".to_string())
        );
    }

    #[tokio::test]
    async fn test_unicast_sends_to_target() {
        // テスト項目: unicast コマンドが指定 ID にだけ DO レコードを送る
        // given (前提条件):
        let target = ConnectionId::try_from("abcd1234").unwrap();
        let expected = target.clone();
        let mut pusher = MockPusher::new();
        pusher
            .expect_send()
            .withf(move |id, payload| {
                id == &expected && Value::Object(payload.clone()) == json!({"DO": [0, 1]})
            })
            .times(1)
            .return_const(true);
        pusher.expect_broadcast().never();

        // when (操作):
        let outcome = execute(
            ConsoleCommand::Unicast {
                id: target,
                values: vec![0, 1],
            },
            &pusher,
        )
        .await;

        // then (期待する結果):
        assert_eq!(
            outcome,
            Outcome::Print("sent {\"DO\":[0,1]} to abcd1234\n".to_string())
        );
    }

    #[tokio::test]
    async fn test_list_prints_connections() {
        // テスト項目: list コマンドが接続一覧を表示する
        // given (前提条件):
        let mut pusher = MockPusher::new();
        pusher.expect_connections().times(1).returning(Vec::new);

        // when (操作):
        let outcome = execute(ConsoleCommand::List, &pusher).await;

        // then (期待する結果):
        assert!(matches!(outcome, Outcome::Print(text) if text.contains("(No devices connected)")));
    }

    #[tokio::test]
    async fn test_exit_touches_nothing() {
        // テスト項目: exit コマンドは何も配信せず終了を返す
        // given (前提条件):
        let mut pusher = MockPusher::new();
        pusher.expect_send().never();
        pusher.expect_broadcast().never();
        pusher.expect_connections().never();

        // when (操作):
        let outcome = execute(ConsoleCommand::Exit, &pusher).await;

        // then (期待する結果):
        assert_eq!(outcome, Outcome::Exit);
    }
}
