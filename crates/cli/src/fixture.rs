//! Loading and sanity-checking backend fixtures.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use approvals_model::HANFORD_ID_LEN;
use approvals_storage::Fixture;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub(crate) enum FixtureError {
    #[error("cannot read fixture {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid fixture {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Something in a fixture that would make the backend misbehave.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum FixtureProblem {
    #[error("process definition {0} is declared more than once")]
    DuplicateDefinition(i64),

    #[error("document type '{0}' has more than one enabled process definition")]
    DuplicateDocumentType(String),

    #[error("process definition {0} has no activities and cannot be routed")]
    EmptyDefinition(i64),

    #[error("process {0} is declared more than once")]
    DuplicateProcess(i64),

    #[error("process {process_id} references unknown process definition {definition_id}")]
    UnknownDefinition { process_id: i64, definition_id: i64 },

    #[error("metadata node '{node_name}' references unknown process {process_id}")]
    OrphanNode { process_id: i64, node_name: String },

    #[error("person '{0}' does not have a {len}-character Hanford id", len = HANFORD_ID_LEN)]
    BadHanfordId(String),
}

#[derive(Debug, Serialize)]
pub(crate) struct FixtureSummary {
    pub definitions: usize,
    pub processes: usize,
    pub people: usize,
    pub nodes: usize,
    pub problems: Vec<String>,
}

pub(crate) fn load(path: &Path) -> Result<Fixture, FixtureError> {
    let text = std::fs::read_to_string(path).map_err(|source| FixtureError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| FixtureError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn check(fixture: &Fixture) -> Vec<FixtureProblem> {
    let mut problems = Vec::new();

    let mut definition_ids = BTreeSet::new();
    let mut enabled_types: BTreeMap<&str, usize> = BTreeMap::new();
    for definition in &fixture.definitions {
        if !definition_ids.insert(definition.process_definition_id) {
            problems.push(FixtureProblem::DuplicateDefinition(
                definition.process_definition_id,
            ));
        }
        if definition.activities.is_empty() {
            problems.push(FixtureProblem::EmptyDefinition(
                definition.process_definition_id,
            ));
        }
        if definition.enabled {
            *enabled_types
                .entry(definition.document_type_name.as_str())
                .or_default() += 1;
        }
    }
    problems.extend(
        enabled_types
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(name, _)| FixtureProblem::DuplicateDocumentType(name.to_string())),
    );

    let mut process_ids = BTreeSet::new();
    for process in &fixture.processes {
        if !process_ids.insert(process.process_id) {
            problems.push(FixtureProblem::DuplicateProcess(process.process_id));
        }
        if !definition_ids.contains(&process.process_definition_id) {
            problems.push(FixtureProblem::UnknownDefinition {
                process_id: process.process_id,
                definition_id: process.process_definition_id,
            });
        }
    }

    problems.extend(
        fixture
            .nodes
            .iter()
            .filter(|node| !process_ids.contains(&node.process_id))
            .map(|node| FixtureProblem::OrphanNode {
                process_id: node.process_id,
                node_name: node.node_name.clone(),
            }),
    );

    for person in &fixture.people {
        if person.hanford_id.chars().count() != HANFORD_ID_LEN {
            problems.push(FixtureProblem::BadHanfordId(person.hanford_id.clone()));
        }
    }

    problems
}

pub(crate) fn summarize(fixture: &Fixture) -> FixtureSummary {
    FixtureSummary {
        definitions: fixture.definitions.len(),
        processes: fixture.processes.len(),
        people: fixture.people.len(),
        nodes: fixture.nodes.len(),
        problems: check(fixture).iter().map(ToString::to_string).collect(),
    }
}
