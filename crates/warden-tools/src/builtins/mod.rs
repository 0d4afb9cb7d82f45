//! Built-in capability handlers

mod exec;
mod read;
mod search;

pub use exec::{CommandExecHandler, MAX_TIMEOUT_SECS};
pub use read::{FileReadHandler, DEFAULT_READ_BYTES, HARD_READ_CAP};
pub use search::{FileSearchHandler, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT, MAX_TRAVERSAL_ENTRIES};

use crate::error::{Error, Result};
use crate::registry::{HandlerContext, HandlerRegistry};
use std::sync::Arc;
use std::time::Instant;
use warden_policy::ToolCall;

/// Register the three built-in handlers
pub fn register_builtins(registry: &mut HandlerRegistry, context: &HandlerContext) {
    registry.register(Arc::new(FileSearchHandler::new(context.clone())));
    registry.register(Arc::new(FileReadHandler::new(context.clone())));
    registry.register(Arc::new(CommandExecHandler::new(context.clone())));
}

/// Optional positive integer argument
fn positive_int_arg(call: &ToolCall, key: &str) -> Result<Option<u64>> {
    match call.arg(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => match value.as_u64() {
            Some(n) if n > 0 => Ok(Some(n)),
            _ => Err(Error::InvalidInput(format!(
                "'{}' must be a positive integer",
                key
            ))),
        },
    }
}

/// Optional string argument
fn optional_str_arg<'a>(call: &'a ToolCall, key: &str) -> Result<Option<&'a str>> {
    match call.arg(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or_else(|| Error::InvalidInput(format!("'{}' must be a string", key))),
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
