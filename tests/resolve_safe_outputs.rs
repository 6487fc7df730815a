//! Integration tests for safe-output directive resolution.

use markflow::parse;

#[test]
fn research_workflow_resolves_three_directives() {
    let json = include_str!("fixtures/research_workflow.json");
    let (_, outputs) = parse::parse_and_resolve(json).expect("Should resolve");

    let keys = outputs.resolved_keys();
    insta::assert_json_snapshot!("resolved_keys", keys);

    let create_issue = outputs.create_issue.expect("create-issue config");
    assert_eq!(create_issue.base.max_or(1), 2);
    assert_eq!(create_issue.fields.title_prefix.as_deref(), Some("[research] "));
    assert_eq!(create_issue.fields.labels, ["automation", "research"]);

    let add_comment = outputs.add_comment.expect("add-comment config");
    assert_eq!(add_comment.target.target_str(), "*");

    assert!(outputs.missing_tool.is_some());
    assert!(outputs.create_pull_request.is_none());
    assert!(outputs.update_release.is_none());
}

#[test]
fn malformed_groups_degrade_independently() {
    let json = include_str!("fixtures/malformed_directives.json");
    let (_, outputs) = parse::parse_and_resolve(json).expect("Should resolve");

    // `max` had the wrong type, so the base group fell back to defaults
    // while the entity fields decoded normally.
    let create_issue = outputs.create_issue.expect("create-issue still present");
    assert_eq!(create_issue.base.max, None);
    assert_eq!(create_issue.base.max_or(1), 1);
    assert_eq!(create_issue.fields.labels, ["ok"]);

    // A scalar body still counts as declared.
    let add_labels = outputs.add_labels.expect("add-labels config");
    assert!(add_labels.fields.allowed.is_empty());

    let update_issue = outputs.update_issue.expect("update-issue config");
    assert!(update_issue.fields.status);
    assert!(!update_issue.fields.title);
    assert!(!update_issue.fields.body);
}

#[test]
fn absent_section_resolves_empty() {
    let (_, outputs) = parse::parse_and_resolve(r#"{"frontmatter": {}, "markdown": "Hi."}"#)
        .expect("Should resolve");
    assert!(outputs.is_empty());
    assert!(outputs.resolved_keys().is_empty());
}

#[test]
fn null_directive_body_enables_defaults() {
    let json = include_str!("fixtures/odd_title.json");
    let (_, outputs) = parse::parse_and_resolve(json).expect("Should resolve");
    let create_issue = outputs.create_issue.expect("create-issue config");
    assert_eq!(create_issue.base.max_or(1), 1);
    assert!(create_issue.fields.title_prefix.is_none());
    assert!(outputs.add_comment.is_none());
}
