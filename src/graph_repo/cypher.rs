// Read-only Cypher guard and graph-value conversion.

use anyhow::{Result, bail};
use neo4rs::{Node, Relation, Row};
use serde_json::{Map, Value, json};

// Clauses that mutate the graph (or smuggle mutation in, like CALL and
// LOAD CSV). Queries arrive from an LLM translator upstream, so the check
// happens lexically here before anything reaches the store.
const FORBIDDEN_CLAUSES: &[&str] = &[
    "create", "merge", "delete", "detach", "set", "remove", "drop", "call", "load", "foreach",
];

/// Reject any query containing a write clause outside of string literals.
pub(super) fn ensure_read_only(query: &str) -> Result<()> {
    for token in tokenize(query) {
        let lowered = token.to_ascii_lowercase();
        if FORBIDDEN_CLAUSES.contains(&lowered.as_str()) {
            bail!("query rejected: write clause '{}' is not allowed", lowered);
        }
    }
    Ok(())
}

/// Split into identifier-ish tokens, skipping quoted string literals.
fn tokenize(query: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in query.chars() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                quote = Some(c);
            }
            c if c.is_alphanumeric() || c == '_' => current.push(c),
            _ => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Convert one result row into a plain property map. Nodes become
/// {labels, properties, id}; relationships become {type, properties,
/// startNode, endNode}; everything else passes through as JSON.
pub(super) fn convert_row(row: &Row) -> Result<Map<String, Value>> {
    let plain: Map<String, Value> = row
        .to()
        .map_err(|e| anyhow::anyhow!("row conversion: {}", e))?;

    let mut out = Map::new();
    for (key, value) in plain {
        if let Ok(node) = row.get::<Node>(key.as_str()) {
            out.insert(key, node_value(&node));
        } else if let Ok(rel) = row.get::<Relation>(key.as_str()) {
            out.insert(key, relation_value(&rel));
        } else {
            out.insert(key, value);
        }
    }
    Ok(out)
}

fn node_value(node: &Node) -> Value {
    let mut properties = Map::new();
    for key in node.keys() {
        if let Ok(v) = node.get::<Value>(key) {
            properties.insert(key.to_string(), v);
        }
    }
    json!({
        "labels": node.labels(),
        "properties": properties,
        "id": node.id(),
    })
}

fn relation_value(rel: &Relation) -> Value {
    let mut properties = Map::new();
    for key in rel.keys() {
        if let Ok(v) = rel.get::<Value>(key) {
            properties.insert(key.to_string(), v);
        }
    }
    json!({
        "type": rel.typ(),
        "properties": properties,
        "startNode": rel.start_node_id(),
        "endNode": rel.end_node_id(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_queries_pass() {
        ensure_read_only("MATCH (h:Host)-[:HAS_SNAPSHOT]->(s) RETURN h, s LIMIT 5").unwrap();
        ensure_read_only("MATCH (s:Snapshot) WHERE s.risk_score > 50 RETURN count(s)").unwrap();
    }

    #[test]
    fn write_clauses_are_rejected() {
        for q in [
            "CREATE (n:Host {agent_id: 'x'})",
            "MATCH (n) DETACH DELETE n",
            "MATCH (n) SET n.hacked = true",
            "MERGE (f:Flag {name: 'x'})",
            "MATCH (n) REMOVE n.agent_id",
            "DROP INDEX host_idx",
            "CALL db.labels()",
            "LOAD CSV FROM 'file:///x' AS row RETURN row",
        ] {
            assert!(ensure_read_only(q).is_err(), "should reject: {}", q);
        }
    }

    #[test]
    fn casing_does_not_bypass_the_guard() {
        assert!(ensure_read_only("match (n) DeLeTe n").is_err());
    }

    #[test]
    fn quoted_literals_are_not_flagged() {
        ensure_read_only("MATCH (f:Flag {name: 'delete'}) RETURN f").unwrap();
        ensure_read_only("MATCH (s) WHERE s.explanation = \"set by hand\" RETURN s").unwrap();
    }
}
