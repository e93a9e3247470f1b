use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::store::{GraphStore, Record, Statement, StoreError};
use crate::value::{map_to_json, GraphValue};

/// Two-hop neighbourhood via APOC, projected to plain maps.
const SUBGRAPH_APOC: &str = "MATCH (p:Post {id: $postId})
CALL apoc.path.subgraphAll(p, {maxLevel: 2}) YIELD nodes, relationships
RETURN [n IN nodes | {elementId: elementId(n), labels: labels(n), properties: properties(n)}] AS nodes,
       [r IN relationships | {start: elementId(startNode(r)), end: elementId(endNode(r)), type: type(r), properties: properties(r)}] AS links";

/// One-hop neighbourhood for stores without APOC. Same projection.
const SUBGRAPH_ONE_HOP: &str = "MATCH (p:Post {id: $postId})
OPTIONAL MATCH (p)-[r]-(n)
WITH p, collect(DISTINCT n) AS ns, collect(DISTINCT r) AS rs
RETURN [x IN [p] + ns | {elementId: elementId(x), labels: labels(x), properties: properties(x)}] AS nodes,
       [r IN rs | {start: elementId(startNode(r)), end: elementId(endNode(r)), type: type(r), properties: properties(r)}] AS links";

const SUMMARY_AND_VERDICT: &str = "MATCH (p:Post {id: $postId})
OPTIONAL MATCH (p)-[:HAS_VERDICT]->(v:FactCheckVerdict)-[:FROM_SOURCE]->(s:FactCheckSource)
RETURN p.summary AS summary, v.value AS verdict, s.name AS verdictSource";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subgraph {
    pub nodes: Vec<SubgraphNode>,
    pub links: Vec<SubgraphLink>,
}

impl Subgraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgraphNode {
    pub id: String,
    pub labels: Vec<String>,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgraphLink {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryVerdict {
    pub summary: Option<String>,
    pub verdict: Option<String>,
    pub verdict_source: Option<String>,
}

/// Read side of the post graph, used by the API.
#[derive(Clone)]
pub struct GraphReader {
    store: Arc<dyn GraphStore>,
}

impl GraphReader {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Nodes and links around a post. Empty when the post is unknown.
    pub async fn fetch_subgraph(&self, post_id: &str) -> Result<Subgraph, StoreError> {
        let apoc = subgraph_statement(SUBGRAPH_APOC, post_id);
        let records = match self.store.run_read(apoc).await {
            Ok(records) => records,
            Err(StoreError::Client(msg)) if is_missing_apoc(&msg) => {
                warn!(post_id, "APOC not available, falling back to one-hop subgraph");
                self.store
                    .run_read(subgraph_statement(SUBGRAPH_ONE_HOP, post_id))
                    .await?
            }
            Err(e) => return Err(e),
        };
        Ok(records.first().map(decode_subgraph).unwrap_or_default())
    }

    /// `None` when the post is unknown.
    pub async fn fetch_summary_and_verdict(
        &self,
        post_id: &str,
    ) -> Result<Option<SummaryVerdict>, StoreError> {
        let stmt = Statement::new(SUMMARY_AND_VERDICT)
            .param("postId", post_id)
            .returns(&["summary", "verdict", "verdictSource"]);
        let records = self.store.run_read(stmt).await?;

        Ok(records.first().map(|r| SummaryVerdict {
            summary: r.get_str("summary").map(str::to_string),
            verdict: r.get_str("verdict").map(str::to_string),
            verdict_source: r.get_str("verdictSource").map(str::to_string),
        }))
    }
}

fn subgraph_statement(cypher: &str, post_id: &str) -> Statement {
    Statement::new(cypher)
        .param("postId", post_id)
        .returns(&["nodes", "links"])
}

fn is_missing_apoc(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("apoc.path.subgraphall")
        && (lower.contains("unknown") || lower.contains("no procedure") || lower.contains("not found"))
}

/// Build the public subgraph from one projected record. A node's public id is
/// its `id` property when it has one, else its element id. Links to nodes
/// outside the set are dropped.
fn decode_subgraph(record: &Record) -> Subgraph {
    let mut public_ids: HashMap<String, String> = HashMap::new();
    let mut nodes = Vec::new();

    for node in record.get("nodes").and_then(GraphValue::as_list).unwrap_or(&[]) {
        let Some(fields) = node.as_map() else { continue };
        let Some(element_id) = fields.get("elementId").and_then(GraphValue::as_str) else {
            continue;
        };
        if public_ids.contains_key(element_id) {
            continue;
        }
        let empty = BTreeMap::new();
        let properties = fields.get("properties").and_then(GraphValue::as_map).unwrap_or(&empty);
        let id = match properties.get("id") {
            Some(GraphValue::String(s)) => s.clone(),
            Some(GraphValue::Int(i)) => i.to_string(),
            _ => element_id.to_string(),
        };
        public_ids.insert(element_id.to_string(), id.clone());
        nodes.push(SubgraphNode {
            id,
            labels: string_list(fields.get("labels")),
            properties: map_to_json(properties),
        });
    }

    let links = record
        .get("links")
        .and_then(GraphValue::as_list)
        .unwrap_or(&[])
        .iter()
        .filter_map(|link| {
            let fields = link.as_map()?;
            let source = public_ids.get(fields.get("start")?.as_str()?)?;
            let target = public_ids.get(fields.get("end")?.as_str()?)?;
            Some(SubgraphLink {
                source: source.clone(),
                target: target.clone(),
                rel_type: fields.get("type")?.as_str()?.to_string(),
                properties: fields
                    .get("properties")
                    .and_then(GraphValue::as_map)
                    .map(map_to_json)
                    .unwrap_or_default(),
            })
        })
        .collect();

    Subgraph { nodes, links }
}

fn string_list(value: Option<&GraphValue>) -> Vec<String> {
    value
        .and_then(GraphValue::as_list)
        .unwrap_or(&[])
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::DateTime;
    use serde_json::json;
    use std::sync::Mutex;

    fn map(pairs: Vec<(&str, GraphValue)>) -> GraphValue {
        GraphValue::Map(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    fn node(element_id: &str, label: &str, props: Vec<(&str, GraphValue)>) -> GraphValue {
        map(vec![
            ("elementId", element_id.into()),
            ("labels", vec![label.to_string()].into()),
            ("properties", map(props)),
        ])
    }

    fn link(start: &str, end: &str, rel: &str) -> GraphValue {
        map(vec![
            ("start", start.into()),
            ("end", end.into()),
            ("type", rel.into()),
            ("properties", map(vec![])),
        ])
    }

    fn subgraph_record(nodes: Vec<GraphValue>, links: Vec<GraphValue>) -> Record {
        Record::from_iter([("nodes", GraphValue::List(nodes)), ("links", GraphValue::List(links))])
    }

    #[test]
    fn node_ids_prefer_id_property_and_dangling_links_are_dropped() {
        let created = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
        let record = subgraph_record(
            vec![
                node("4:a:1", "Post", vec![("id", "p1".into()), ("createdAt", created.into())]),
                node("4:a:2", "Author", vec![("name", "Ada".into())]),
            ],
            vec![link("4:a:2", "4:a:1", "CREATED"), link("4:a:1", "4:a:99", "MENTIONS")],
        );

        let graph = decode_subgraph(&record);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].id, "p1");
        assert_eq!(graph.nodes[0].properties["createdAt"], json!("2024-01-01T00:00:00Z"));
        assert_eq!(graph.nodes[1].id, "4:a:2");
        assert_eq!(graph.links.len(), 1);
        assert_eq!(graph.links[0].source, "4:a:2");
        assert_eq!(graph.links[0].target, "p1");
        assert_eq!(graph.links[0].rel_type, "CREATED");
    }

    #[test]
    fn link_serializes_type_field() {
        let l = SubgraphLink {
            source: "a".into(),
            target: "b".into(),
            rel_type: "AT_TIME".into(),
            properties: Map::new(),
        };
        assert_eq!(
            serde_json::to_value(l).unwrap(),
            json!({"source": "a", "target": "b", "type": "AT_TIME", "properties": {}})
        );
    }

    /// Fails the APOC query with `apoc_error`, answers everything else with
    /// `records`.
    struct FakeStore {
        apoc_error: Option<StoreError>,
        records: Vec<Record>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl GraphStore for FakeStore {
        async fn run_write(&self, _statement: Statement) -> Result<Vec<Record>, StoreError> {
            Ok(vec![])
        }

        async fn run_read(&self, statement: Statement) -> Result<Vec<Record>, StoreError> {
            let is_apoc = statement.cypher.contains("apoc.path");
            self.seen.lock().unwrap().push(statement.cypher);
            match (&self.apoc_error, is_apoc) {
                (Some(e), true) => Err(e.clone()),
                _ => Ok(self.records.clone()),
            }
        }
    }

    fn reader(apoc_error: Option<StoreError>, records: Vec<Record>) -> (GraphReader, Arc<FakeStore>) {
        let store = Arc::new(FakeStore {
            apoc_error,
            records,
            seen: Mutex::new(vec![]),
        });
        (GraphReader::new(store.clone()), store)
    }

    #[tokio::test]
    async fn falls_back_to_one_hop_without_apoc() {
        let record = subgraph_record(vec![node("1", "Post", vec![("id", "p1".into())])], vec![]);
        let (reader, store) = reader(
            Some(StoreError::Client(
                "There is no procedure with the name `apoc.path.subgraphAll` registered".into(),
            )),
            vec![record],
        );

        let graph = reader.fetch_subgraph("p1").await.unwrap();
        assert_eq!(graph.nodes.len(), 1);
        let seen = store.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[1].contains("OPTIONAL MATCH (p)-[r]-(n)"));
    }

    #[tokio::test]
    async fn other_errors_do_not_fall_back() {
        let (reader, store) = reader(Some(StoreError::Unavailable("down".into())), vec![]);
        assert!(reader.fetch_subgraph("p1").await.unwrap_err().is_unavailable());
        assert_eq!(store.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_post_is_empty_or_none() {
        let (reader, _) = reader(None, vec![]);
        assert!(reader.fetch_subgraph("nope").await.unwrap().is_empty());
        assert_eq!(reader.fetch_summary_and_verdict("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn summary_without_verdict_has_null_verdict() {
        let record = Record::from_iter([
            ("summary", GraphValue::from("short")),
            ("verdict", GraphValue::Null),
            ("verdictSource", GraphValue::Null),
        ]);
        let (reader, _) = reader(None, vec![record]);

        let sv = reader.fetch_summary_and_verdict("p1").await.unwrap().unwrap();
        assert_eq!(sv.summary.as_deref(), Some("short"));
        assert_eq!(
            serde_json::to_value(sv).unwrap(),
            json!({"summary": "short", "verdict": null, "verdictSource": null})
        );
    }
}
