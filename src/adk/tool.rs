// SPDX-License-Identifier: MIT

use crate::error::AppError;
use async_trait::async_trait;
use serde_json::Value;

/// Trait for tools the assistant can call.
///
/// `name()` and `schema()` hand out borrowed values; implementations keep
/// them in fields or statics.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique within an agent's tool set
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the input object
    fn schema(&self) -> &Value;

    async fn execute(&self, input: Value) -> Result<Value, AppError>;
}
