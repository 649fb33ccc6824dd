//! Builtin tools.

use async_trait::async_trait;
use chrono::{Datelike, Local};
use serde_json::{json, Value};

use crate::{ActionResponse, Tool, ToolError, ToolType};

/// Reports today's weekday; the model phrases the reply.
pub struct DayOfWeekTool;

#[async_trait]
impl Tool for DayOfWeekTool {
    fn name(&self) -> &str {
        "get_day_of_week"
    }

    fn description(&self) -> &str {
        "Get the current day of the week. Use when the user asks what day it is."
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    fn tool_type(&self) -> ToolType {
        ToolType::Wait
    }

    async fn call(&self, _args: Value) -> Result<ActionResponse, ToolError> {
        let today = Local::now();
        Ok(ActionResponse::req_llm(json!({
            "day_of_week": today.weekday().to_string(),
            "date": today.date_naive().to_string(),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Action;

    #[tokio::test]
    async fn returns_req_llm_with_weekday() {
        let outcome = DayOfWeekTool.call(json!({})).await.unwrap();
        assert_eq!(outcome.action, Action::ReqLlm);
        let result = outcome.result.unwrap();
        assert!(result["day_of_week"].is_string());
        assert!(result["date"].is_string());
    }
}
