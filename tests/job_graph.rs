//! Integration tests for job graph dependency rules.

mod helpers;

use markflow::jobs::{AGENT_JOB_ID, Job, JobGraph};

#[test]
fn compiled_workflow_wires_consumers_to_agent() {
    let json = include_str!("fixtures/research_workflow.json");
    let lock = helpers::compile(json).expect("Should compile");

    let ids: Vec<&str> = lock.jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["agent", "create_issue", "add_comment", "missing_tool"]);

    assert!(lock.jobs[0].needs.is_empty());
    for job in lock.jobs.iter().skip(1) {
        assert_eq!(job.needs, vec![AGENT_JOB_ID.to_string()], "job {}", job.id);
    }
}

#[test]
fn workflow_title_never_leaks_into_identifiers() {
    let json = include_str!("fixtures/odd_title.json");
    let lock = helpers::compile(json).expect("Should compile");

    let ids: Vec<&str> = lock.jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["agent", "create_issue"]);

    let text = lock.render();
    assert!(text.contains("name: \"CI/CD: Pipeline (v2.0) @main\""));
    assert!(!text.contains("CI/CD:\n"));
}

#[test]
fn rule_violations_accumulate() {
    let mut graph = JobGraph::new();
    let mut a = Job::new("a");
    a.needs.push("b".into());
    let mut b = Job::new("b");
    b.needs.push("a".into());
    b.consumes_agent_output = true;
    graph.add(a).unwrap();
    graph.add(b).unwrap();

    let codes: Vec<String> = graph.validate().into_iter().map(|e| e.code).collect();
    assert!(codes.contains(&"J004".to_string()), "cycle: {:?}", codes);
    assert!(codes.contains(&"J005".to_string()), "consumer edge: {:?}", codes);
    assert!(codes.contains(&"J006".to_string()), "agent presence: {:?}", codes);
}

#[test]
fn needs_unknown_job_reported_with_owner() {
    let mut graph = JobGraph::new();
    graph.add(Job::new(AGENT_JOB_ID)).unwrap();
    let mut job = Job::new("notify");
    job.needs.push("reporter".into());
    graph.add(job).unwrap();

    let errors = graph.validate();
    let err = errors.iter().find(|e| e.code == "J002").expect("J002 reported");
    assert_eq!(err.job.as_deref(), Some("notify"));
    assert!(err.message.contains("reporter"));
}
