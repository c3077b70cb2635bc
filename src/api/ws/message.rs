// src/api/ws/message.rs

use serde::{Deserialize, Serialize};

use crate::session::OutputEvent;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type")]
pub enum WsClientMessage {
    #[serde(rename = "run_code")]
    RunCode {
        code: String,
        #[serde(default)]
        session_id: Option<String>,
    },
    #[serde(rename = "send_input")]
    SendInput { session_id: String, input: String },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type")]
pub enum WsServerMessage {
    #[serde(rename = "session_started")]
    SessionStarted { session_id: String },
    #[serde(rename = "output")]
    Output {
        session_id: String,
        output: Vec<OutputEvent>,
    },
    #[serde(rename = "input_required")]
    InputRequired { session_id: String },
    #[serde(rename = "execution_complete")]
    ExecutionComplete { session_id: String, exit_code: i32 },
    #[serde(rename = "input_sent")]
    InputSent { session_id: String },
    #[serde(rename = "execution_error")]
    ExecutionError {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },
    #[serde(rename = "error")]
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_run_code_parses_without_session_id() {
        let msg: WsClientMessage =
            serde_json::from_str(r#"{"type":"run_code","code":"print(1)"}"#).unwrap();
        match msg {
            WsClientMessage::RunCode { code, session_id } => {
                assert_eq!(code, "print(1)");
                assert!(session_id.is_none());
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn client_send_input_parses() {
        let msg: WsClientMessage =
            serde_json::from_str(r#"{"type":"send_input","session_id":"abc","input":"Ada"}"#)
                .unwrap();
        match msg {
            WsClientMessage::SendInput { session_id, input } => {
                assert_eq!(session_id, "abc");
                assert_eq!(input, "Ada");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn server_messages_tag_by_type() {
        let json = serde_json::to_value(WsServerMessage::ExecutionComplete {
            session_id: "abc".into(),
            exit_code: 0,
        })
        .unwrap();
        assert_eq!(json["type"], "execution_complete");
        assert_eq!(json["exit_code"], 0);

        let json = serde_json::to_value(WsServerMessage::ExecutionError {
            message: "spawn failed".into(),
            session_id: None,
        })
        .unwrap();
        assert_eq!(json["type"], "execution_error");
        assert!(json.get("session_id").is_none());
    }
}
