use super::error::SemanticError;
use super::types::SemanticQuery;

/// Pull the semantic query out of free-form model output.
///
/// Models tend to wrap the JSON in prose or code fences, so the widest
/// `{ ... }` span (first opening brace to last closing brace) is parsed.
pub fn extract_semantic_query(raw: &str) -> Result<SemanticQuery, SemanticError> {
    let json = json_object_span(raw).ok_or(SemanticError::NoJsonObject)?;
    Ok(serde_json::from_str(json)?)
}

fn json_object_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_wrapped_in_prose() {
        let raw = "Here is the query:\n```json\n{\"tables\": [\"users\"], \"limit\": 5}\n```\nDone.";
        let query = extract_semantic_query(raw).unwrap();
        assert_eq!(query.tables, vec!["users".to_string()]);
        assert_eq!(query.limit, Some(5));
    }

    #[test]
    fn nested_objects_are_kept_whole() {
        let raw = r#"{"tables":["t"],"conditions":[{"column":"a","operator":"=","value":1}]}"#;
        let query = extract_semantic_query(raw).unwrap();
        assert_eq!(query.conditions.len(), 1);
    }

    #[test]
    fn missing_object_is_reported() {
        assert!(matches!(
            extract_semantic_query("no json here"),
            Err(SemanticError::NoJsonObject)
        ));
        assert!(matches!(
            extract_semantic_query("} backwards {"),
            Err(SemanticError::NoJsonObject)
        ));
    }

    #[test]
    fn malformed_object_is_a_json_error() {
        assert!(matches!(
            extract_semantic_query("{\"tables\": [\"t\"], \"conditions\": [{\"column\": \"a\", \"operator\": \"NOT IN\"}]}"),
            Err(SemanticError::Json(_))
        ));
    }
}
