//! JSON-RPC 2.0 envelope and request-params wire types. Hand-written rather than built on a generic JSON-RPC crate — see
//! `DESIGN.md` for why.

use cce_core::{AppError, CommandId, JsonRpcError};
use cce_process::CommandSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    #[allow(dead_code)]
    pub jsonrpc: Option<String>,
    pub id: CommandId,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: CommandId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn ok(id: CommandId, result: Value) -> Self {
        Self { jsonrpc: "2.0", id, result: Some(result), error: None }
    }

    pub fn err(id: CommandId, error: JsonRpcError) -> Self {
        Self { jsonrpc: "2.0", id, result: None, error: Some(error) }
    }
}

/// A server-initiated frame with no `id`.
#[derive(Debug, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: Value,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self { jsonrpc: "2.0", method: method.into(), params }
    }
}

/// `execute` params: either a raw command string or the structured,
/// unambiguous `{executable, args[]}` form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ExecuteParams {
    Raw {
        command: String,
        timeout: Option<f64>,
        #[serde(default)]
        env: Option<HashMap<String, String>>,
    },
    Structured {
        executable: String,
        #[serde(default)]
        args: Vec<String>,
        timeout: Option<f64>,
        #[serde(default)]
        env: Option<HashMap<String, String>>,
    },
}

impl ExecuteParams {
    pub fn timeout(&self) -> Option<f64> {
        match self {
            ExecuteParams::Raw { timeout, .. } => *timeout,
            ExecuteParams::Structured { timeout, .. } => *timeout,
        }
    }

    pub fn env(&self) -> HashMap<String, String> {
        match self {
            ExecuteParams::Raw { env, .. } => env.clone(),
            ExecuteParams::Structured { env, .. } => env.clone(),
        }
        .unwrap_or_default()
    }

    pub fn to_command_spec(&self) -> Result<CommandSpec, AppError> {
        match self {
            ExecuteParams::Raw { command, .. } => CommandSpec::from_raw(command),
            ExecuteParams::Structured { executable, args, .. } => {
                Ok(CommandSpec::structured(executable.clone(), args.clone()))
            }
        }
    }
}

pub fn parse_execute_params(params: Option<Value>) -> Result<ExecuteParams, AppError> {
    let value = params.ok_or_else(|| AppError::InvalidParams("missing params".to_string()))?;
    serde_json::from_value(value).map_err(|e| AppError::InvalidParams(e.to_string()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ControlKind {
    Pause,
    Resume,
    Cancel,
}

#[derive(Debug, Deserialize)]
pub struct ControlParams {
    #[serde(rename = "type")]
    pub kind: ControlKind,
}

pub fn parse_control_params(params: Option<Value>) -> Result<ControlParams, AppError> {
    let value = params.ok_or_else(|| AppError::InvalidParams("missing params".to_string()))?;
    serde_json::from_value(value).map_err(|e| AppError::InvalidParams(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_params_accept_raw_command() {
        let value = serde_json::json!({"command": "echo hi", "timeout": 30.0});
        let params = parse_execute_params(Some(value)).unwrap();
        assert_eq!(params.timeout(), Some(30.0));
        let spec = params.to_command_spec().unwrap();
        assert_eq!(spec.executable, "echo");
    }

    #[test]
    fn execute_params_accept_structured_form() {
        let value = serde_json::json!({"executable": "echo", "args": ["hi"]});
        let params = parse_execute_params(Some(value)).unwrap();
        let spec = params.to_command_spec().unwrap();
        assert_eq!(spec.executable, "echo");
        assert_eq!(spec.args, vec!["hi".to_string()]);
    }

    #[test]
    fn control_params_parse_uppercase_type() {
        let value = serde_json::json!({"type": "CANCEL"});
        let params = parse_control_params(Some(value)).unwrap();
        assert!(matches!(params.kind, ControlKind::Cancel));
    }

    #[test]
    fn missing_params_is_invalid_params_error() {
        assert!(parse_execute_params(None).is_err());
    }
}
