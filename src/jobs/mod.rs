//! Job graph and naming authority.
//!
//! The main execution job always carries the fixed identifier
//! [`AGENT_JOB_ID`]; downstream jobs reference it by that identifier, never
//! by the workflow title. `JobGraph` owns the dependency rules (J001–J006)
//! and preserves insertion order, which is the emission order.

use std::collections::HashMap;

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};

use crate::error::CompilerError;

/// Identifier of the main execution job in every compiled pipeline.
pub const AGENT_JOB_ID: &str = "agent";

/// Runner label used when the frontmatter does not choose one.
pub const DEFAULT_RUNNER: &str = "ubuntu-latest";

// =============================================================================
// JOB DATA
// =============================================================================

/// One pipeline job under construction. Steps are fully rendered YAML step
/// blocks; the graph treats them as opaque text.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub display_name: Option<String>,
    pub needs: Vec<String>,
    pub condition: Option<String>,
    pub runs_on: String,
    pub permissions: Vec<(String, String)>,
    pub timeout_minutes: Option<u64>,
    pub outputs: Vec<(String, String)>,
    pub steps: Vec<String>,
    /// Reads the agent job's collected output, so it must `needs` the agent.
    pub consumes_agent_output: bool,
}

impl Job {
    pub fn new(id: impl Into<String>) -> Self {
        Job {
            id: id.into(),
            display_name: None,
            needs: Vec::new(),
            condition: None,
            runs_on: DEFAULT_RUNNER.to_string(),
            permissions: Vec::new(),
            timeout_minutes: None,
            outputs: Vec::new(),
            steps: Vec::new(),
            consumes_agent_output: false,
        }
    }
}

/// Finished job: identifier, dependencies, and the rendered body the writer
/// splices under `jobs:`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub id: String,
    pub needs: Vec<String>,
    pub body: String,
}

// =============================================================================
// JOB GRAPH
// =============================================================================

pub struct JobGraph {
    jobs: Vec<Job>,
}

impl Default for JobGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl JobGraph {
    pub fn new() -> Self {
        JobGraph { jobs: Vec::new() }
    }

    /// Add a job. Duplicate identifiers are fatal.
    pub fn add(&mut self, job: Job) -> Result<(), CompilerError> {
        if self.jobs.iter().any(|j| j.id == job.id) {
            return Err(CompilerError::graph(
                "J001",
                format!("Duplicate job identifier '{}'", job.id),
                Some(job.id),
            ));
        }
        self.jobs.push(job);
        Ok(())
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn into_jobs(self) -> Vec<Job> {
        self.jobs
    }

    /// Run all dependency rules. Returns all errors found.
    pub fn validate(&self) -> Vec<CompilerError> {
        let mut errors = Vec::new();

        j002_needs_reference_existing_jobs(&self.jobs, &mut errors);
        j003_no_self_dependencies(&self.jobs, &mut errors);
        j004_no_cycles(&self.jobs, &mut errors);
        j005_consumers_depend_on_agent(&self.jobs, &mut errors);
        j006_agent_job_present(&self.jobs, &mut errors);

        errors
    }
}

fn j002_needs_reference_existing_jobs(jobs: &[Job], errors: &mut Vec<CompilerError>) {
    for job in jobs {
        for dep in &job.needs {
            if !jobs.iter().any(|j| &j.id == dep) {
                errors.push(CompilerError::graph(
                    "J002",
                    format!("Job '{}' needs unknown job '{}'", job.id, dep),
                    Some(job.id.clone()),
                ));
            }
        }
    }
}

fn j003_no_self_dependencies(jobs: &[Job], errors: &mut Vec<CompilerError>) {
    for job in jobs {
        if job.needs.iter().any(|dep| dep == &job.id) {
            errors.push(CompilerError::graph(
                "J003",
                format!("Job '{}' depends on itself", job.id),
                Some(job.id.clone()),
            ));
        }
    }
}

fn j004_no_cycles(jobs: &[Job], errors: &mut Vec<CompilerError>) {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut indices = HashMap::new();
    for job in jobs {
        indices.insert(job.id.as_str(), graph.add_node(job.id.as_str()));
    }
    for job in jobs {
        for dep in &job.needs {
            if let (Some(&from), Some(&to)) = (indices.get(dep.as_str()), indices.get(job.id.as_str()))
            {
                graph.add_edge(from, to, ());
            }
        }
    }
    if is_cyclic_directed(&graph) {
        errors.push(CompilerError::graph(
            "J004",
            "Job dependency graph contains a cycle",
            None,
        ));
    }
}

fn j005_consumers_depend_on_agent(jobs: &[Job], errors: &mut Vec<CompilerError>) {
    for job in jobs {
        if job.consumes_agent_output && !job.needs.iter().any(|dep| dep == AGENT_JOB_ID) {
            errors.push(CompilerError::graph(
                "J005",
                format!(
                    "Job '{}' consumes agent output but does not depend on '{}'",
                    job.id, AGENT_JOB_ID
                ),
                Some(job.id.clone()),
            ));
        }
    }
}

fn j006_agent_job_present(jobs: &[Job], errors: &mut Vec<CompilerError>) {
    if !jobs.iter().any(|j| j.id == AGENT_JOB_ID) {
        errors.push(CompilerError::graph(
            "J006",
            format!("Pipeline has no '{}' job", AGENT_JOB_ID),
            None,
        ));
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> Job {
        Job::new(AGENT_JOB_ID)
    }

    fn consumer(id: &str) -> Job {
        let mut job = Job::new(id);
        job.needs.push(AGENT_JOB_ID.to_string());
        job.consumes_agent_output = true;
        job
    }

    fn codes(errors: &[CompilerError]) -> Vec<&str> {
        errors.iter().map(|e| e.code.as_str()).collect()
    }

    #[test]
    fn valid_graph_passes() {
        let mut graph = JobGraph::new();
        graph.add(agent()).unwrap();
        graph.add(consumer("create_issue")).unwrap();
        assert!(graph.validate().is_empty());
    }

    #[test]
    fn duplicate_identifier_is_fatal() {
        let mut graph = JobGraph::new();
        graph.add(agent()).unwrap();
        let err = graph.add(agent()).unwrap_err();
        assert_eq!(err.code, "J001");
        assert_eq!(err.job.as_deref(), Some(AGENT_JOB_ID));
    }

    #[test]
    fn unknown_needs_target_reported() {
        let mut graph = JobGraph::new();
        graph.add(agent()).unwrap();
        let mut job = Job::new("add_comment");
        job.needs.push("missing".to_string());
        graph.add(job).unwrap();
        assert!(codes(&graph.validate()).contains(&"J002"));
    }

    #[test]
    fn self_dependency_reported() {
        let mut graph = JobGraph::new();
        graph.add(agent()).unwrap();
        let mut job = Job::new("loop");
        job.needs.push("loop".to_string());
        graph.add(job).unwrap();
        assert!(codes(&graph.validate()).contains(&"J003"));
    }

    #[test]
    fn cycle_reported() {
        let mut graph = JobGraph::new();
        graph.add(agent()).unwrap();
        let mut a = Job::new("a");
        a.needs.push("b".to_string());
        let mut b = Job::new("b");
        b.needs.push("a".to_string());
        graph.add(a).unwrap();
        graph.add(b).unwrap();
        assert!(codes(&graph.validate()).contains(&"J004"));
    }

    #[test]
    fn consumer_without_agent_edge_reported() {
        let mut graph = JobGraph::new();
        graph.add(agent()).unwrap();
        let mut job = Job::new("create_issue");
        job.consumes_agent_output = true;
        graph.add(job).unwrap();
        let errors = graph.validate();
        assert!(codes(&errors).contains(&"J005"));
        assert!(errors.iter().any(|e| e.message.contains("create_issue")));
    }

    #[test]
    fn missing_agent_job_reported() {
        let mut graph = JobGraph::new();
        graph.add(Job::new("orphan")).unwrap();
        assert!(codes(&graph.validate()).contains(&"J006"));
    }
}
