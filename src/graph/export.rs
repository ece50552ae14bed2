//! Graph exporters
//!
//! Every exporter is a pure function of the graph: the same graph always
//! produces byte-identical output.

use crate::graph::{Graph, GraphFormat, WeightScale};
use crate::url::Identifier;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// What an export wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub nodes_emitted: usize,
    pub edges_processed: usize,
}

/// Characters escaped in adjacency fields: the `;` separator, and `%` so
/// an escaped field stays unambiguous
const ADJACENCY_FIELD_SET: &AsciiSet = &CONTROLS.add(b';').add(b'%');

/// Settings for [`export`]
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub format: GraphFormat,
    /// Name of the DOT digraph
    pub graph_name: String,
    /// Write DOT edges one per line with weights; `None` for grouped edges
    pub weights: Option<WeightScale>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: GraphFormat::default(),
            graph_name: "wikipedia".to_string(),
            weights: None,
        }
    }
}

/// Writes a graph in the requested format
pub fn export(graph: &Graph, options: &ExportOptions) -> serde_json::Result<(String, ExportStats)> {
    match options.format {
        GraphFormat::Adjacency => Ok(to_adjacency(graph)),
        GraphFormat::Dot => Ok(to_dot(graph, &options.graph_name, options.weights)),
        GraphFormat::Json => to_json(graph),
    }
}

/// Adjacency list: one `node;link1;link2` line per content node
///
/// Nodes and links are sorted. A content node without links is written as
/// `node;`. Dangling nodes appear only as links. Identifiers containing `;`
/// or `%` are percent-encoded (`%3B`, `%25`) so every field splits cleanly.
pub fn to_adjacency(graph: &Graph) -> (String, ExportStats) {
    let mut out = String::new();
    let mut stats = ExportStats::default();

    for (node, _) in graph.content_nodes() {
        out.push_str(&adjacency_field(node));
        out.push(';');

        let mut first = true;
        for (target, _) in graph.targets(node) {
            if !first {
                out.push(';');
            }
            out.push_str(&adjacency_field(target));
            first = false;
            stats.edges_processed += 1;
        }

        out.push('\n');
        stats.nodes_emitted += 1;
    }

    (out, stats)
}

fn adjacency_field(id: &Identifier) -> Cow<'_, str> {
    utf8_percent_encode(id.as_str(), ADJACENCY_FIELD_SET).into()
}

/// Graphviz digraph
///
/// Content nodes get sequential numeric IDs in sorted order and a label with
/// their title (or identifier). Edges to nodes without an ID are dropped.
///
/// # Arguments
///
/// * `graph` - The graph to write
/// * `name` - The digraph name
/// * `weights` - `None` groups each node's targets as `a -> {b;c};`;
///   `Some(scale)` writes `a -> b [weight = w];` per edge
///
/// # Example
///
/// ```
/// use link_mapper::graph::{to_dot, AggregationPolicy, GraphBuilder};
/// use link_mapper::url::Identifier;
///
/// let mut builder = GraphBuilder::new(AggregationPolicy::Occurrences);
/// builder.observe(Identifier::new("A"), Identifier::new("B"), 1);
/// builder.observe(Identifier::new("B"), Identifier::new("A"), 1);
/// let (dot, _) = to_dot(&builder.build(), "wikipedia", None);
///
/// assert_eq!(
///     dot,
///     "digraph wikipedia {\n  0 [label = \"A\"];\n  1 [label = \"B\"];\n  0 -> {1};\n  1 -> {0};\n}\n"
/// );
/// ```
pub fn to_dot(graph: &Graph, name: &str, weights: Option<WeightScale>) -> (String, ExportStats) {
    let mut out = String::new();
    let mut stats = ExportStats::default();

    let ids: BTreeMap<&Identifier, usize> = graph
        .content_nodes()
        .enumerate()
        .map(|(index, (node, _))| (node, index))
        .collect();

    out.push_str(&format!("digraph {} {{\n", name));

    for (node, title) in graph.content_nodes() {
        let label = title.unwrap_or(node.as_str());
        out.push_str(&format!(
            "  {} [label = \"{}\"];\n",
            ids[node],
            escape_label(label)
        ));
        stats.nodes_emitted += 1;
    }

    for (node, _) in graph.content_nodes() {
        let source = ids[node];
        let mut kept = Vec::new();

        for (target, weight) in graph.targets(node) {
            stats.edges_processed += 1;
            if let Some(target_id) = ids.get(target) {
                kept.push((*target_id, weight));
            }
        }

        match weights {
            None if !kept.is_empty() => {
                let targets: Vec<String> = kept.iter().map(|(t, _)| t.to_string()).collect();
                out.push_str(&format!("  {} -> {{{}}};\n", source, targets.join(";")));
            }
            None => {}
            Some(scale) => {
                for (target, weight) in kept {
                    out.push_str(&format!(
                        "  {} -> {} [weight = {}];\n",
                        source,
                        target,
                        scale.format(weight)
                    ));
                }
            }
        }
    }

    out.push_str("}\n");
    (out, stats)
}

fn escape_label(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Nested JSON edge map `{source: {target: weight}}` with raw weights
///
/// Content nodes without edges are written with an empty map so they
/// survive a round trip through [`load_traffic`].
pub fn to_json(graph: &Graph) -> serde_json::Result<(String, ExportStats)> {
    let mut map: BTreeMap<&str, BTreeMap<&str, u64>> = BTreeMap::new();
    let mut stats = ExportStats::default();

    for (node, _) in graph.content_nodes() {
        let targets = map.entry(node.as_str()).or_default();
        for (target, weight) in graph.targets(node) {
            targets.insert(target.as_str(), weight);
            stats.edges_processed += 1;
        }
        stats.nodes_emitted += 1;
    }

    let mut out = serde_json::to_string_pretty(&map)?;
    out.push('\n');
    Ok((out, stats))
}

/// Reads a JSON edge map written by [`to_json`] or a traffic logger
pub fn load_traffic(
    path: &Path,
) -> Result<BTreeMap<Identifier, BTreeMap<Identifier, u64>>, crate::MapperError> {
    let reader = BufReader::new(File::open(path)?);
    let traffic = serde_json::from_reader(reader)?;
    Ok(traffic)
}
