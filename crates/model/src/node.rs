use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::process::ProcessId;

/// One metadata value extracted from a routed document, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessNode {
    pub process_id: ProcessId,
    pub node_name: String,
    #[serde(default)]
    pub node_label: Option<String>,
    #[serde(default)]
    pub node_data_type: Option<String>,
    #[serde(default)]
    pub node_value: Option<String>,
}

/// A metadata value without its owning process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub node_name: String,
    pub node_label: Option<String>,
    pub node_data_type: Option<String>,
    pub node_value: Option<String>,
}

impl From<ProcessNode> for Node {
    fn from(node: ProcessNode) -> Self {
        Self {
            node_name: node.node_name,
            node_label: node.node_label,
            node_data_type: node.node_data_type,
            node_value: node.node_value,
        }
    }
}

/// All metadata of one process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessNodeResult {
    pub process_id: ProcessId,
    pub nodes: Vec<Node>,
}

/// Group stored rows by process, ordered by process id. Nodes keep their
/// row order within a process.
pub fn group_nodes(rows: impl IntoIterator<Item = ProcessNode>) -> Vec<ProcessNodeResult> {
    let mut grouped: BTreeMap<ProcessId, Vec<Node>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.process_id).or_default().push(row.into());
    }
    grouped
        .into_iter()
        .map(|(process_id, nodes)| ProcessNodeResult { process_id, nodes })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(process_id: ProcessId, name: &str, value: &str) -> ProcessNode {
        ProcessNode {
            process_id,
            node_name: name.to_string(),
            node_label: None,
            node_data_type: Some("string".to_string()),
            node_value: Some(value.to_string()),
        }
    }

    #[test]
    fn rows_group_by_process_in_id_order() {
        let grouped = group_nodes(vec![
            row(7, "Destination", "Denver"),
            row(2, "Amount", "120.00"),
            row(7, "Nights", "3"),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].process_id, 2);
        assert_eq!(grouped[1].process_id, 7);
        let names: Vec<_> = grouped[1].nodes.iter().map(|n| n.node_name.as_str()).collect();
        assert_eq!(names, ["Destination", "Nights"]);
    }

    #[test]
    fn fixture_rows_only_need_a_name() {
        let node: ProcessNode =
            serde_json::from_str(r#"{"processId": 1, "nodeName": "CostCenter"}"#).unwrap();
        assert_eq!(node.node_value, None);
        assert_eq!(Node::from(node).node_name, "CostCenter");
    }
}
