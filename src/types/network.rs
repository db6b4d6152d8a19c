use std::{fs::File, io::BufReader};

use bevy::{color::Srgba, prelude::Resource};
use serde::{Deserialize, Serialize};

use crate::types::Coord;

/// Marker fill for nodes whose status contains "Active".
pub const NODE_ACTIVE_COLOR: Srgba = Srgba::new(0.298, 0.686, 0.314, 0.8);
/// Marker fill for every other status.
pub const NODE_STANDBY_COLOR: Srgba = Srgba::new(1.0, 0.757, 0.027, 0.8);
/// Connection lines and hub-side link markers.
pub const LINK_PRIMARY_COLOR: Srgba = Srgba::new(0.4, 0.494, 0.918, 1.0);
/// Far-side link markers.
pub const LINK_SECONDARY_COLOR: Srgba = Srgba::new(0.463, 0.294, 0.635, 1.0);

/// Which node pairs get a connection line on the 2D map, by index into the
/// node sequence. Pairs that fall outside the sequence are skipped.
pub const CONNECTIONS: [(usize, usize); 5] = [(0, 1), (0, 2), (2, 3), (3, 4), (1, 2)];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkNode {
    pub name: String,
    pub status: String,
    pub capacity: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl NetworkNode {
    pub fn coord(&self) -> Coord {
        Coord::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    #[serde(flatten)]
    pub pos: Coord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkLink {
    pub source: Endpoint,
    pub target: Endpoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
#[serde(rename_all = "camelCase")]
pub struct NetworkData {
    pub nodes: Vec<NetworkNode>,
    pub links: Vec<NetworkLink>,
}

pub fn status_color(status: &str) -> Srgba {
    if status.contains("Active") {
        NODE_ACTIVE_COLOR
    } else {
        NODE_STANDBY_COLOR
    }
}

/// The static connection table restricted to pairs that actually index into
/// `nodes`. Out-of-range pairs are dropped without a report.
pub fn valid_connections(nodes: &[NetworkNode]) -> Vec<(usize, usize)> {
    CONNECTIONS
        .iter()
        .copied()
        .filter(|&(from, to)| from < nodes.len() && to < nodes.len())
        .collect()
}

/// Reads the node/link dataset the host supplies.
pub fn load_network(path: &str) -> Result<NetworkData, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let data: NetworkData = serde_json::from_reader(reader)?;
    Ok(data)
}

/// Built-in dataset used when no `network.json` is available.
pub fn demo_network() -> NetworkData {
    let sites = [
        ("Chattanooga Hub", "Active - Hub", 100.0, 35.0456, -85.3097),
        ("Oak Ridge", "Active", 80.0, 36.0104, -84.2696),
        ("Atlanta", "Active", 80.0, 33.749, -84.388),
        ("Washington DC", "Standby", 40.0, 38.9072, -77.0369),
        ("Boston", "Planned", 40.0, 42.3601, -71.0589),
    ];

    let nodes: Vec<NetworkNode> = sites
        .iter()
        .map(|&(name, status, capacity, latitude, longitude)| NetworkNode {
            name: name.to_string(),
            status: status.to_string(),
            capacity,
            latitude,
            longitude,
        })
        .collect();

    let hub = Endpoint {
        name: nodes[0].name.clone(),
        pos: nodes[0].coord(),
    };
    let links = nodes[1..]
        .iter()
        .map(|node| NetworkLink {
            source: hub.clone(),
            target: Endpoint {
                name: node.name.clone(),
                pos: node.coord(),
            },
        })
        .collect();

    NetworkData { nodes, links }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_substring_picks_green() {
        assert_eq!(status_color("Active"), NODE_ACTIVE_COLOR);
        assert_eq!(status_color("Active - Hub"), NODE_ACTIVE_COLOR);
        // Case-sensitive: "Inactive" does not contain "Active".
        assert_eq!(status_color("Inactive"), NODE_STANDBY_COLOR);
        assert_eq!(status_color("Standby"), NODE_STANDBY_COLOR);
        assert_eq!(status_color("Planned"), NODE_STANDBY_COLOR);
        assert_eq!(status_color(""), NODE_STANDBY_COLOR);
    }

    #[test]
    fn out_of_range_connections_are_skipped() {
        let demo = demo_network();

        assert_eq!(valid_connections(&demo.nodes), CONNECTIONS.to_vec());
        // Three nodes keep only the pairs touching indices 0..3.
        assert_eq!(
            valid_connections(&demo.nodes[..3]),
            vec![(0, 1), (0, 2), (1, 2)]
        );
        assert!(valid_connections(&[]).is_empty());
    }

    #[test]
    fn dataset_round_trips_through_json() {
        let raw = r#"{
            "nodes": [
                { "name": "Chattanooga Hub", "status": "Active - Hub",
                  "capacity": 100.0, "latitude": 35.0456, "longitude": -85.3097 }
            ],
            "links": [
                { "source": { "name": "Chattanooga Hub", "lat": 35.0456, "lng": -85.3097 },
                  "target": { "name": "Atlanta", "lat": 33.749, "lng": -84.388 } }
            ]
        }"#;

        let data: NetworkData = serde_json::from_str(raw).unwrap();
        assert_eq!(data.nodes.len(), 1);
        assert_eq!(data.links[0].target.pos, Coord::new(33.749, -84.388));
        assert_eq!(status_color(&data.nodes[0].status), NODE_ACTIVE_COLOR);
    }

    #[test]
    fn bundled_dataset_loads() {
        let data = load_network("assets/network.json").unwrap();
        assert_eq!(data.nodes.len(), 5);
        assert_eq!(data.links.len(), 4);

        // Every link endpoint is one of the nodes.
        for link in &data.links {
            for endpoint in [&link.source, &link.target] {
                assert!(
                    data.nodes.iter().any(|n| n.coord() == endpoint.pos),
                    "unknown endpoint {:?}",
                    endpoint.name
                );
            }
        }
        assert_eq!(valid_connections(&data.nodes).len(), CONNECTIONS.len());
    }

    #[test]
    fn demo_links_start_at_the_hub() {
        let demo = demo_network();
        assert_eq!(demo.nodes.len(), 5);
        assert_eq!(demo.links.len(), 4);
        for link in &demo.links {
            assert_eq!(link.source.pos, demo.nodes[0].coord());
        }
    }
}
