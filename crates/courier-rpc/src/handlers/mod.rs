//! RPC handler modules and registration.

pub mod subagent;
pub mod system;

use crate::registry::MethodRegistry;

/// Register all RPC handlers with the registry.
pub fn register_all(registry: &mut MethodRegistry) {
    // System
    registry.register("system.ping", system::PingHandler);

    // Subagent runs
    registry.register("subagent.stop", subagent::StopRunHandler);
    registry.register("subagent.stopAll", subagent::StopAllHandler);
    registry.register("subagent.list", subagent::ListRunsHandler);
}

/// Extract a required string parameter, rejecting blank values.
pub(crate) fn require_string_param(
    params: Option<&serde_json::Value>,
    key: &str,
) -> Result<String, crate::errors::RpcError> {
    let value = params.and_then(|p| p.get(key)).ok_or_else(|| {
        crate::errors::RpcError::InvalidRequest {
            message: format!("Missing required parameter: {key}"),
        }
    })?;
    match value.as_str() {
        Some(s) if !s.trim().is_empty() => Ok(s.to_owned()),
        Some(_) => Err(crate::errors::RpcError::InvalidRequest {
            message: format!("Parameter '{key}' must not be empty"),
        }),
        None => Err(crate::errors::RpcError::InvalidRequest {
            message: format!("Parameter '{key}' must be a string"),
        }),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MethodRegistry;
    use serde_json::json;

    #[test]
    fn register_all_covers_expected_methods() {
        let mut reg = MethodRegistry::new();
        register_all(&mut reg);

        for method in ["system.ping", "subagent.stop", "subagent.stopAll", "subagent.list"] {
            assert!(reg.has_method(method), "missing {method}");
        }
    }

    #[test]
    fn require_string_param_ok() {
        let params = Some(json!({"runId": "run-1"}));
        assert_eq!(
            require_string_param(params.as_ref(), "runId").unwrap(),
            "run-1"
        );
    }

    #[test]
    fn require_string_param_missing() {
        let err = require_string_param(None, "runId").unwrap_err();
        assert_eq!(err.code(), "INVALID_REQUEST");
    }

    #[test]
    fn require_string_param_blank() {
        let params = Some(json!({"runId": "  "}));
        let err = require_string_param(params.as_ref(), "runId").unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn require_string_param_wrong_type() {
        let params = Some(json!({"runId": 42}));
        let err = require_string_param(params.as_ref(), "runId").unwrap_err();
        assert!(err.to_string().contains("must be a string"));
    }
}
