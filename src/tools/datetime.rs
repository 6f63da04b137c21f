//! Date arithmetic tool.

use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate};
use serde_json::{json, Value};

use crate::error::Result;
use crate::tool::Tool;

pub struct DateOffsetTool;

#[async_trait]
impl Tool for DateOffsetTool {
    fn name(&self) -> &str {
        "date_offset"
    }

    fn description(&self) -> &str {
        "Return the calendar date N days from today as YYYY-MM-DD. Expects {\"days\": integer}; days may be negative."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "days": {
                    "type": "integer",
                    "description": "Number of days from today, negative for past dates"
                }
            },
            "required": ["days"]
        }))
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let Some(days) = input.get("days").and_then(Value::as_i64) else {
            return Ok(json!({ "error": "`days` must be an integer" }));
        };

        let today = Local::now().date_naive();
        match offset(today, days) {
            Some(date) => Ok(json!({
                "days": days,
                "date": date.format("%Y-%m-%d").to_string(),
            })),
            None => Ok(json!({ "error": format!("offset of {days} days is out of range") })),
        }
    }
}

fn offset(from: NaiveDate, days: i64) -> Option<NaiveDate> {
    // Duration::days panics out of range; try_days keeps huge offsets an error.
    Duration::try_days(days).and_then(|delta| from.checked_add_signed(delta))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn offsets_forward_from_today() {
        let result = DateOffsetTool.call(json!({"days": 7})).await.unwrap();
        let expected = Local::now().date_naive() + Duration::days(7);
        assert_eq!(result["date"], expected.format("%Y-%m-%d").to_string());
    }

    #[tokio::test]
    async fn negative_offsets_go_backwards() {
        let result = DateOffsetTool.call(json!({"days": -1})).await.unwrap();
        let expected = Local::now().date_naive() - Duration::days(1);
        assert_eq!(result["date"], expected.format("%Y-%m-%d").to_string());
    }

    #[tokio::test]
    async fn non_integer_days_is_an_error_payload() {
        let result = DateOffsetTool.call(json!({"days": "soon"})).await.unwrap();
        assert!(result["error"].as_str().unwrap().contains("integer"));
    }

    #[test]
    fn out_of_range_offset_is_none() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 25).unwrap();
        assert!(offset(today, i64::MAX / 2).is_none());
    }
}
