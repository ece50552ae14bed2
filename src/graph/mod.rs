//! Link graph construction and export
//!
//! This module handles:
//! - Aggregating page records and traffic observations into a weighted graph
//! - Writing the graph as an adjacency list, a DOT document or a JSON edge map
//! - Reading JSON edge maps back for re-aggregation

mod export;

pub use export::{
    export, load_traffic, to_adjacency, to_dot, to_json, ExportOptions, ExportStats,
};

use crate::storage::PageRecord;
use crate::url::Identifier;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// How repeated observations of the same edge combine into its weight
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AggregationPolicy {
    /// Weight is 1 for every edge that was seen at all
    Presence,
    /// Weight counts independent observations
    #[default]
    Occurrences,
    /// Weight sums the observed volume
    Traffic,
}

impl fmt::Display for AggregationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Presence => write!(f, "presence"),
            Self::Occurrences => write!(f, "occurrences"),
            Self::Traffic => write!(f, "traffic"),
        }
    }
}

/// Output format for a graph export
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum GraphFormat {
    /// `node;link1;link2` lines
    #[default]
    Adjacency,
    /// Graphviz digraph
    Dot,
    /// `{source: {target: weight}}`
    Json,
}

impl fmt::Display for GraphFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adjacency => write!(f, "adjacency"),
            Self::Dot => write!(f, "dot"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Transform applied to edge weights when they are written out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WeightScale {
    #[default]
    Raw,
    Log2,
}

impl WeightScale {
    /// Formats a raw weight under this scale
    pub fn format(&self, weight: u64) -> String {
        match self {
            Self::Raw => weight.to_string(),
            Self::Log2 => format!("{:.3}", (weight.max(1) as f64).log2()),
        }
    }
}

/// A directed, weighted link graph
///
/// Nodes are every page that was fetched plus every link target. Content
/// nodes are the ones that emitted edges or had a record of their own; the
/// rest are dangling. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    nodes: BTreeSet<Identifier>,
    content: BTreeMap<Identifier, Option<String>>,
    adjacency: BTreeMap<Identifier, BTreeMap<Identifier, u64>>,
}

impl Graph {
    /// All nodes, sorted
    pub fn nodes(&self) -> impl Iterator<Item = &Identifier> {
        self.nodes.iter()
    }

    /// Content nodes with their titles, sorted by identifier
    pub fn content_nodes(&self) -> impl Iterator<Item = (&Identifier, Option<&str>)> {
        self.content
            .iter()
            .map(|(id, title)| (id, title.as_deref()))
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.nodes.contains(id)
    }

    pub fn is_content(&self, id: &Identifier) -> bool {
        self.content.contains_key(id)
    }

    pub fn title(&self, id: &Identifier) -> Option<&str> {
        self.content.get(id).and_then(|title| title.as_deref())
    }

    /// Outbound edges of a node with their weights, sorted by target
    pub fn targets(&self, source: &Identifier) -> impl Iterator<Item = (&Identifier, u64)> {
        self.adjacency
            .get(source)
            .into_iter()
            .flat_map(|targets| targets.iter().map(|(target, weight)| (target, *weight)))
    }

    /// All edges as `(source, target, weight)`, sorted
    pub fn edges(&self) -> impl Iterator<Item = (&Identifier, &Identifier, u64)> {
        self.adjacency.iter().flat_map(|(source, targets)| {
            targets
                .iter()
                .map(move |(target, weight)| (source, target, *weight))
        })
    }

    pub fn weight(&self, source: &Identifier, target: &Identifier) -> Option<u64> {
        self.adjacency.get(source)?.get(target).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn content_count(&self) -> usize {
        self.content.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeMap::len).sum()
    }
}

/// Accumulates records and observations into a [`Graph`]
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    policy: AggregationPolicy,
    graph: Graph,
}

impl GraphBuilder {
    pub fn new(policy: AggregationPolicy) -> Self {
        Self {
            policy,
            graph: Graph::default(),
        }
    }

    pub fn policy(&self) -> AggregationPolicy {
        self.policy
    }

    /// Adds a page record: one observation of volume 1 per distinct link
    pub fn add_record(&mut self, record: &PageRecord) -> &mut Self {
        let title = self
            .graph
            .content
            .entry(record.identifier.clone())
            .or_insert(None);
        if record.title.is_some() {
            title.clone_from(&record.title);
        }
        self.graph.nodes.insert(record.identifier.clone());

        for link in &record.links {
            self.observe(record.identifier.clone(), link.clone(), 1);
        }
        self
    }

    pub fn add_records<'a>(&mut self, records: impl IntoIterator<Item = &'a PageRecord>) -> &mut Self {
        for record in records {
            self.add_record(record);
        }
        self
    }

    /// Adds a nested `{source: {target: volume}}` map, as read by [`load_traffic`]
    pub fn add_traffic(&mut self, traffic: BTreeMap<Identifier, BTreeMap<Identifier, u64>>) -> &mut Self {
        for (source, targets) in traffic {
            self.graph.content.entry(source.clone()).or_insert(None);
            self.graph.nodes.insert(source.clone());
            for (target, volume) in targets {
                self.observe(source.clone(), target, volume);
            }
        }
        self
    }

    /// Records one observation of `source -> target` carrying `volume`
    ///
    /// The source becomes a content node; the target is a node but stays
    /// dangling until it is observed as a source or added as a record.
    pub fn observe(&mut self, source: Identifier, target: Identifier, volume: u64) -> &mut Self {
        self.graph.nodes.insert(source.clone());
        self.graph.nodes.insert(target.clone());
        self.graph.content.entry(source.clone()).or_insert(None);

        let weight = self
            .graph
            .adjacency
            .entry(source)
            .or_default()
            .entry(target)
            .or_insert(0);

        *weight = match self.policy {
            AggregationPolicy::Presence => 1,
            AggregationPolicy::Occurrences => weight.saturating_add(1),
            AggregationPolicy::Traffic => weight.saturating_add(volume),
        };
        self
    }

    pub fn build(self) -> Graph {
        self.graph
    }
}
