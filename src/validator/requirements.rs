//! Keyword and feature matching against user requirements.

use crate::model::{Tool, UserRequirements};

/// Check one tool against the requirements.
///
/// Every keyword must occur in the description (case-insensitive substring)
/// and every required feature must be in the tool's feature set.
pub fn validate_one(tool: &Tool, requirements: &UserRequirements) -> bool {
    let description = tool.description.to_lowercase();

    let keywords_match = requirements
        .keywords
        .iter()
        .all(|keyword| description.contains(&keyword.to_lowercase()));

    keywords_match && requirements.features.is_subset(&tool.features)
}

/// Stable filter: the passing tools, in input order.
pub fn validate_batch(tools: &[Tool], requirements: &UserRequirements) -> Vec<Tool> {
    tools
        .iter()
        .filter(|tool| validate_one(tool, requirements))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(name: &str, description: &str) -> Tool {
        Tool::new(name, description, "test")
    }

    #[test]
    fn test_all_keywords_required() {
        let t = tool("a", "Boosts Memory and focus");
        assert!(validate_one(&t, &UserRequirements::with_keywords(["memory"])));
        assert!(validate_one(&t, &UserRequirements::with_keywords(["MEMORY", "Focus"])));
        assert!(!validate_one(&t, &UserRequirements::with_keywords(["memory", "sleep"])));
    }

    #[test]
    fn test_empty_requirements_accept_everything() {
        let t = tool("a", "anything");
        assert!(validate_one(&t, &UserRequirements::default()));
    }

    #[test]
    fn test_features_must_be_contained() {
        let t = tool("a", "notes").with_features(["offline", "sync"]);

        let mut req = UserRequirements::default();
        req.features.insert("offline".into());
        assert!(validate_one(&t, &req));

        req.features.insert("export".into());
        assert!(!validate_one(&t, &req));
    }

    #[test]
    fn test_feature_match_is_exact() {
        let t = tool("a", "notes").with_features(["Offline"]);
        let mut req = UserRequirements::default();
        req.features.insert("offline".into());
        assert!(!validate_one(&t, &req));
    }

    #[test]
    fn test_batch_is_stable_subsequence() {
        let tools = vec![
            tool("a", "memory palace"),
            tool("b", "timer"),
            tool("c", "memory cards"),
            tool("d", "Memory journal"),
        ];
        let out = validate_batch(&tools, &UserRequirements::with_keywords(["memory"]));

        let names: Vec<_> = out.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "d"]);
        assert!(out.len() <= tools.len());
    }

    #[test]
    fn test_missing_keyword_fails_for_every_tool() {
        let tools = vec![tool("a", "alpha"), tool("b", "beta"), tool("c", "")];
        let req = UserRequirements::with_keywords(["gamma"]);
        assert!(tools.iter().all(|t| !validate_one(t, &req)));
        assert!(validate_batch(&tools, &req).is_empty());
    }
}
