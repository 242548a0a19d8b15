use serde::Serialize;
use serde_json::{json, Map, Value};

/// Body of `POST /rest/api/2/issue`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CreateIssuePayload {
    pub fields: Map<String, Value>,
}

/// Builds the create-issue request body.
///
/// Extra fields are merged last, so a key such as `summary` in
/// `extra_fields` replaces the standard value.
pub fn build_payload(
    project: &str,
    issue_type: &str,
    summary: &str,
    description: &str,
    extra_fields: Map<String, Value>,
) -> CreateIssuePayload {
    let mut fields = Map::new();
    fields.insert("project".to_string(), json!({ "key": project }));
    fields.insert("issuetype".to_string(), json!({ "name": issue_type }));
    fields.insert("summary".to_string(), Value::from(summary));
    fields.insert("description".to_string(), Value::from(description));
    fields.extend(extra_fields);
    CreateIssuePayload { fields }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extra(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_build_payload() {
        let payload = build_payload(
            "FOO",
            "Bug",
            "The summary",
            "The description with some {{code}}",
            extra(json!({"foo": "bar", "custom_field": [{"name": "foo"}]})),
        );
        assert_eq!(payload.fields.len(), 6);
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "fields": {
                    "custom_field": [{"name": "foo"}],
                    "description": "The description with some {{code}}",
                    "foo": "bar",
                    "issuetype": {"name": "Bug"},
                    "project": {"key": "FOO"},
                    "summary": "The summary"
                }
            })
        );
    }

    #[test]
    fn test_extra_fields_override_standard_fields() {
        let payload = build_payload(
            "FOO",
            "Bug",
            "The summary",
            "",
            extra(json!({"summary": "Replaced", "issuetype": {"id": "10001"}})),
        );
        assert_eq!(payload.fields.len(), 4);
        assert_eq!(payload.fields["summary"], json!("Replaced"));
        assert_eq!(payload.fields["issuetype"], json!({"id": "10001"}));
    }

    #[test]
    fn test_build_payload_without_extra_fields() {
        let payload = build_payload("FOO", "Task", "s", "d", Map::new());
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "fields": {
                    "project": {"key": "FOO"},
                    "issuetype": {"name": "Task"},
                    "summary": "s",
                    "description": "d"
                }
            })
        );
    }
}
