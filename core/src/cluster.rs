//! Spatial clustering engine: radius-based grouping of unique retailers.
//!
//! Two retailers are directly connected when their haversine distance is
//! at most the configured radius. A cluster is a connected component of
//! that proximity graph with at least the effective minimum member count;
//! smaller components are noise and never materialize as output entities.
//! This is single-linkage density clustering with no core-point
//! distinction: every retailer is eligible to seed a component.
//!
//! Determinism: membership depends only on the distance graph, never on
//! traversal order. Cluster ids and member order follow first-seen input
//! rank, so repeated runs over the same input produce identical listings.

use crate::config::PipelineConfig;
use crate::geo::{centroid, GeoPoint};
use crate::normalize::Retailer;
use crate::types::ClusterId;

/// A maximal set of mutually reachable retailers. Members are indices
/// into the retailer table handed to `cluster_retailers` — back-references
/// only, the cluster owns nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub id: ClusterId,
    /// Ordered by first-seen input rank, ascending.
    pub members: Vec<usize>,
    pub centroid: GeoPoint,
}

impl Cluster {
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// Clusters plus the noise set (retailer indices in no cluster).
#[derive(Debug, Clone, Default)]
pub struct ClusterOutcome {
    pub clusters: Vec<Cluster>,
    pub noise: Vec<usize>,
}

/// Partition retailers into proximity clusters and noise.
///
/// O(n²) pairwise distances; adequate at the expected scale of hundreds
/// to low thousands of unique retailers.
pub fn cluster_retailers(retailers: &[Retailer], config: &PipelineConfig) -> ClusterOutcome {
    let n = retailers.len();
    let min_members = config.effective_min_members();
    let mut components = DisjointSet::new(n);

    for i in 0..n {
        for j in (i + 1)..n {
            let distance = retailers[i].position.distance_m(&retailers[j].position);
            if distance <= config.radius_meters {
                components.union(i, j);
            }
        }
    }

    // Group indices by component root. Retailers arrive in first-seen
    // order, so ascending index order is already the stable member order.
    let mut by_root: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        by_root[components.find(i)].push(i);
    }

    let mut outcome = ClusterOutcome::default();
    for members in by_root.into_iter().filter(|m| !m.is_empty()) {
        if members.len() < min_members {
            outcome.noise.extend(members);
            continue;
        }
        let positions: Vec<GeoPoint> = members.iter().map(|&i| retailers[i].position).collect();
        let Some(center) = centroid(&positions) else {
            continue;
        };
        outcome.clusters.push(Cluster {
            id: 0, // assigned after ordering below
            members,
            centroid: center,
        });
    }

    // Order clusters by their earliest-seen member and assign stable ids.
    outcome.clusters.sort_by_key(|c| c.members[0]);
    outcome.noise.sort_unstable();
    for (id, cluster) in outcome.clusters.iter_mut().enumerate() {
        cluster.id = id as ClusterId;
    }

    log::info!(
        "Clustered {} retailers into {} clusters ({} noise) at radius {} m",
        n,
        outcome.clusters.len(),
        outcome.noise.len(),
        config.radius_meters
    );
    outcome
}

/// Minimal union-find with path compression and union by size.
struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
    }
}
