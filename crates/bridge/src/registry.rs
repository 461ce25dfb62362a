use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A remote procedure declared by the automation subprocess, loaded once
/// from `tools/list` at bridge startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcedureDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", default = "default_input_schema")]
    pub input_schema: Value,
}

fn default_input_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

/// Reduce the full registry to an administrator-defined allow-list.
///
/// The result is always a subset of `full` with its relative order
/// preserved. Allow-listed names the subprocess never declared are
/// omitted: a capability the bridge cannot serve must not be advertised.
pub fn filter_capabilities(
    full: &[ProcedureDefinition],
    allow_list: &[String],
) -> Vec<ProcedureDefinition> {
    full.iter()
        .filter(|def| allow_list.iter().any(|name| name == &def.name))
        .cloned()
        .collect()
}

/// Expose definitions as OpenAI-style function schemas for model selection.
pub fn to_function_schemas(defs: &[ProcedureDefinition]) -> Vec<Value> {
    defs.iter()
        .map(|def| {
            json!({
                "type": "function",
                "function": {
                    "name": def.name,
                    "description": def.description.clone().unwrap_or_default(),
                    "parameters": def.input_schema,
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str) -> ProcedureDefinition {
        ProcedureDefinition {
            name: name.to_string(),
            description: Some(format!("{} description", name)),
            input_schema: default_input_schema(),
        }
    }

    fn names(defs: &[ProcedureDefinition]) -> Vec<&str> {
        defs.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_filter_intersection() {
        let full = vec![def("navigate_page"), def("performance_start_trace"), def("take_screenshot")];
        let allow = vec![
            "navigate_page".to_string(),
            "take_screenshot".to_string(),
            "list_console_messages".to_string(),
        ];
        let reduced = filter_capabilities(&full, &allow);
        assert_eq!(names(&reduced), vec!["navigate_page", "take_screenshot"]);
    }

    #[test]
    fn test_filter_preserves_registry_order() {
        let full = vec![def("c"), def("a"), def("b")];
        let allow = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let reduced = filter_capabilities(&full, &allow);
        assert_eq!(names(&reduced), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_filter_never_invents_names() {
        let full = vec![def("navigate_page")];
        let allow = vec!["navigate_page".to_string(), "not_a_real_tool".to_string()];
        let reduced = filter_capabilities(&full, &allow);
        assert_eq!(reduced.len(), 1);
        assert!(reduced.iter().all(|d| full.iter().any(|f| f.name == d.name)));
    }

    #[test]
    fn test_filter_empty_allow_list() {
        let full = vec![def("navigate_page")];
        assert!(filter_capabilities(&full, &[]).is_empty());
    }

    #[test]
    fn test_parse_definition_without_schema() {
        let raw = r#"{"name": "take_snapshot", "description": "Capture the DOM"}"#;
        let parsed: ProcedureDefinition = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.name, "take_snapshot");
        assert_eq!(parsed.input_schema["type"], "object");
    }

    #[test]
    fn test_function_schema_shape() {
        let defs = vec![def("navigate_page")];
        let schemas = to_function_schemas(&defs);
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0]["type"], "function");
        assert_eq!(schemas[0]["function"]["name"], "navigate_page");
        assert!(schemas[0]["function"]["parameters"].is_object());
    }
}
