//! search_items tool implementation.

use std::sync::Arc;

use rmcp::model::{JsonObject, Tool};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::client::{DEFAULT_LIMIT, Item, SearchQuery, SearchResult};
use crate::error::ArenaError;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Tool name advertised to clients.
pub const SEARCH_ITEMS: &str = "search_items";

const DESCRIPTION: &str =
    "Search for items in Arena PLM. Returns matching items with their details.";

/// Text returned when a search matches nothing.
pub const NO_ITEMS_FOUND: &str = "No items found.";

/// Placeholder for a missing item number or name.
const NOT_AVAILABLE: &str = "N/A";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Arguments accepted by `search_items`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchItemsInput {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub number: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub category_guid: Option<String>,

    #[serde(default)]
    pub limit: Option<u32>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl SearchItemsInput {
    /// Decode tool call arguments. Missing arguments mean "no filters".
    pub fn from_arguments(arguments: Option<JsonObject>) -> Result<Self, ArenaError> {
        let value = Value::Object(arguments.unwrap_or_default());
        serde_json::from_value(value).map_err(|e| ArenaError::InvalidArguments(e.to_string()))
    }

    /// Build the first-page search query for these arguments.
    pub fn to_query(&self) -> SearchQuery {
        SearchQuery {
            name: self.name.clone(),
            number: self.number.clone(),
            description: self.description.clone(),
            category_guid: self.category_guid.clone(),
            ..SearchQuery::default()
        }
        .with_limit(self.limit.unwrap_or(DEFAULT_LIMIT))
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Catalog entry for `search_items`.
pub fn tool() -> Tool {
    Tool::new(SEARCH_ITEMS, DESCRIPTION, Arc::new(input_schema()))
}

/// JSON schema for the tool's arguments.
pub fn input_schema() -> JsonObject {
    let properties = json!({
        "name": {
            "type": "string",
            "description": "Filter by item name (partial match)"
        },
        "number": {
            "type": "string",
            "description": "Filter by item number (partial match)"
        },
        "description": {
            "type": "string",
            "description": "Filter by description (partial match)"
        },
        "category_guid": {
            "type": "string",
            "description": "Filter by category GUID"
        },
        "limit": {
            "type": "integer",
            "description": "Max results to return (default 20, max 400)",
            "default": DEFAULT_LIMIT
        }
    });

    let mut schema = JsonObject::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), properties);
    schema.insert("additionalProperties".to_string(), json!(false));
    schema
}

/// Render a result page as text for the calling agent.
pub fn format_results(result: &SearchResult) -> String {
    if result.count == 0 {
        return NO_ITEMS_FOUND.to_string();
    }

    let mut lines = vec![format!("Found {} item(s):\n", result.count)];
    lines.extend(result.results.iter().map(format_item));
    lines.join("\n")
}

fn format_item(item: &Item) -> String {
    let number = item.number.as_ref().map_or_else(|| NOT_AVAILABLE.to_string(), value_text);
    let name = item.name.as_ref().map_or_else(|| NOT_AVAILABLE.to_string(), value_text);
    let mut line = format!("- {number}: {name}");

    if let Some(revision) = &item.revision_number {
        line.push_str(&format!(" (Rev {})", value_text(revision)));
    }

    if let Some(phase) = item.lifecycle_phase.as_ref().and_then(|p| p.name.as_ref()) {
        line.push_str(&format!(" [{}]", value_text(phase)));
    }

    line
}

/// Strings render bare; any other JSON value renders as JSON.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MAX_LIMIT;

    fn result_from(value: Value) -> SearchResult {
        serde_json::from_value(value).unwrap()
    }

    // ==================== Formatting tests ====================

    #[test]
    fn test_format_zero_results() {
        let result = result_from(json!({ "count": 0, "results": [] }));
        assert_eq!(format_results(&result), "No items found.");
    }

    #[test]
    fn test_format_two_items() {
        let result = result_from(json!({
            "count": 2,
            "results": [
                { "number": "P-1", "name": "Widget" },
                {
                    "number": "P-2",
                    "name": "Gadget",
                    "revisionNumber": "B",
                    "lifecyclePhase": { "name": "Released" }
                }
            ]
        }));

        assert_eq!(
            format_results(&result),
            "Found 2 item(s):\n\n- P-1: Widget\n- P-2: Gadget (Rev B) [Released]"
        );
    }

    #[test]
    fn test_format_missing_fields_use_placeholder() {
        let result = result_from(json!({ "count": 1, "results": [{}] }));
        assert_eq!(format_results(&result), "Found 1 item(s):\n\n- N/A: N/A");
    }

    #[test]
    fn test_format_null_revision_is_absent() {
        let result = result_from(json!({
            "count": 1,
            "results": [{ "number": "P-3", "name": "Bolt", "revisionNumber": null }]
        }));
        assert_eq!(format_results(&result), "Found 1 item(s):\n\n- P-3: Bolt");
    }

    #[test]
    fn test_format_empty_revision_is_present() {
        let result = result_from(json!({
            "count": 1,
            "results": [{ "number": "P-4", "name": "Nut", "revisionNumber": "" }]
        }));
        assert_eq!(format_results(&result), "Found 1 item(s):\n\n- P-4: Nut (Rev )");
    }

    #[test]
    fn test_format_non_string_number() {
        let result = result_from(json!({
            "count": 2,
            "results": [
                { "number": "P-1", "name": "Widget" },
                { "number": 1001, "name": "Bolt", "revisionNumber": 2 }
            ]
        }));
        assert_eq!(
            format_results(&result),
            "Found 2 item(s):\n\n- P-1: Widget\n- 1001: Bolt (Rev 2)"
        );
    }

    #[test]
    fn test_format_null_count_is_no_items() {
        let result = result_from(json!({ "count": null, "results": [] }));
        assert_eq!(format_results(&result), "No items found.");
    }

    #[test]
    fn test_format_count_comes_from_response() {
        let result = result_from(json!({
            "count": 5,
            "results": [
                { "number": "P-1", "name": "Widget" },
                { "number": "P-2", "name": "Gadget" }
            ]
        }));
        assert_eq!(
            format_results(&result),
            "Found 5 item(s):\n\n- P-1: Widget\n- P-2: Gadget"
        );
    }

    #[test]
    fn test_format_phase_without_name() {
        let result = result_from(json!({
            "count": 1,
            "results": [{ "number": "P-5", "name": "Gear", "lifecyclePhase": { "guid": "X" } }]
        }));
        assert_eq!(format_results(&result), "Found 1 item(s):\n\n- P-5: Gear");
    }

    // ==================== Argument tests ====================

    #[test]
    fn test_arguments_none_means_no_filters() {
        let input = SearchItemsInput::from_arguments(None).unwrap();
        assert_eq!(input, SearchItemsInput::default());

        let query = input.to_query();
        assert_eq!(query.limit, DEFAULT_LIMIT);
        assert_eq!(query.offset, 0);
        assert_eq!(query.name, None);
    }

    #[test]
    fn test_arguments_decoded() {
        let args = json!({ "name": "Widget", "category_guid": "CAT", "limit": 50 });
        let input = SearchItemsInput::from_arguments(args.as_object().cloned()).unwrap();
        let query = input.to_query();

        assert_eq!(query.name.as_deref(), Some("Widget"));
        assert_eq!(query.category_guid.as_deref(), Some("CAT"));
        assert_eq!(query.limit, 50);
    }

    #[test]
    fn test_arguments_limit_passed_through() {
        let args = json!({ "limit": 10_000 });
        let input = SearchItemsInput::from_arguments(args.as_object().cloned()).unwrap();
        assert!(input.to_query().limit > MAX_LIMIT);
    }

    #[test]
    fn test_arguments_reject_unknown_fields() {
        let args = json!({ "offset": 40 });
        let result = SearchItemsInput::from_arguments(args.as_object().cloned());
        assert!(matches!(result, Err(ArenaError::InvalidArguments(_))));
    }

    #[test]
    fn test_arguments_reject_wrong_type() {
        let args = json!({ "limit": "twenty" });
        let result = SearchItemsInput::from_arguments(args.as_object().cloned());
        assert!(matches!(result, Err(ArenaError::InvalidArguments(_))));
    }

    // ==================== Schema tests ====================

    #[test]
    fn test_tool_descriptor() {
        let tool = tool();
        assert_eq!(tool.name, SEARCH_ITEMS);
        assert_eq!(tool.description.as_deref(), Some(DESCRIPTION));
    }

    #[test]
    fn test_input_schema_shape() {
        let schema = Value::Object(input_schema());

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["additionalProperties"], false);
        for field in ["name", "number", "description", "category_guid"] {
            assert_eq!(schema["properties"][field]["type"], "string", "{field}");
        }
        assert_eq!(schema["properties"]["limit"]["type"], "integer");
        assert_eq!(schema["properties"]["limit"]["default"], 20);
        assert_eq!(schema["properties"].as_object().unwrap().len(), 5);
    }
}
