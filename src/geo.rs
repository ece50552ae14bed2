//! Geolocation of graph nodes
//!
//! Graphs built from traffic logs have network addresses as nodes. A
//! [`GeoResolver`] maps an address to a coordinate, and [`place_nodes`]
//! splits the nodes of a graph into those that can be drawn and those that
//! cannot. Unresolved nodes are only left out of the placement; the graph
//! itself is never changed.

use crate::graph::Graph;
use crate::url::Identifier;
use crate::MapperError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

impl From<Coordinate> for (f64, f64) {
    fn from(coordinate: Coordinate) -> Self {
        (coordinate.lat, coordinate.lon)
    }
}

/// Maps an address-like identifier to a coordinate
pub trait GeoResolver {
    /// Returns `None` when the address cannot be located
    fn locate(&self, address: &str) -> Option<Coordinate>;
}

/// Resolver backed by a fixed lookup table
#[derive(Debug, Clone, Default)]
pub struct TableResolver {
    table: HashMap<String, Coordinate>,
}

impl TableResolver {
    pub fn new(table: HashMap<String, Coordinate>) -> Self {
        Self { table }
    }

    /// Loads a JSON object of the form `{"address": [lat, lon]}`
    pub fn from_json_file(path: &Path) -> Result<Self, MapperError> {
        let reader = BufReader::new(File::open(path)?);
        let table = serde_json::from_reader(reader)?;
        Ok(Self { table })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl GeoResolver for TableResolver {
    fn locate(&self, address: &str) -> Option<Coordinate> {
        self.table.get(address).copied()
    }
}

/// Result of placing graph nodes on a map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePlacement {
    pub positions: BTreeMap<Identifier, Coordinate>,
    pub unresolved: Vec<Identifier>,
}

/// Locates every node of the graph
pub fn place_nodes(graph: &Graph, resolver: &dyn GeoResolver) -> NodePlacement {
    let mut placement = NodePlacement::default();

    for node in graph.nodes() {
        match resolver.locate(node.as_str()) {
            Some(coordinate) => {
                placement.positions.insert(node.clone(), coordinate);
            }
            None => {
                tracing::debug!("Address not found: {}", node);
                placement.unresolved.push(node.clone());
            }
        }
    }

    placement
}
