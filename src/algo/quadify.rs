//! Random greedy quadification.
//!
//! Merges pairs of adjacent triangles into quads by deleting the edge they
//! share. Edges are visited in a random order; once a triangle has been
//! merged, none of its edges is considered again, so every triangle takes
//! part in at most one merge.
//!
//! After a pass no two surviving triangles share an edge: an edge between
//! two surviving triangles would have found both unconsumed when its turn
//! came.

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::graph::{EdgeId, Graph, LoopAdjacency};

/// Outcome of a quadification pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuadifyReport {
    /// Shared edges deleted (one per merged triangle pair).
    pub edges_deleted: usize,
    /// Triangles left unmerged.
    pub triangles: usize,
    /// Quads after the pass.
    pub quads: usize,
}

/// Merge adjacent triangle pairs into quads in a random order.
///
/// Randomness comes only from `rng`; passing the same seeded generator
/// reproduces the same result. Loops other than triangles are left alone.
///
/// All deletions are planned against a single snapshot of the face loops and
/// committed together at the end.
pub fn quadification<R: Rng + ?Sized>(graph: &mut Graph, rng: &mut R) -> Result<QuadifyReport> {
    let adjacency = LoopAdjacency::build(graph)?;
    let loops = adjacency.loops();

    let mut order: Vec<EdgeId> = graph.edge_ids().collect();
    order.shuffle(rng);

    let mut visited = vec![false; graph.edge_slots()];
    let mut doomed = Vec::new();

    for e in order {
        if visited[e.index()] {
            continue;
        }
        let [left, right] = adjacency.adjacent_indices(graph, e)?;
        if loops[left].len() != 3 || loops[right].len() != 3 {
            continue;
        }

        for side in [left, right] {
            for edge in loops[side].edge_ids(graph)? {
                visited[edge.index()] = true;
            }
        }
        doomed.push(e);
    }

    for &e in &doomed {
        graph.delete_edge(e);
    }

    let before = loops.iter().filter(|l| l.len() == 3).count();
    let quads_before = loops.iter().filter(|l| l.len() == 4).count();
    let report = QuadifyReport {
        edges_deleted: doomed.len(),
        triangles: before - 2 * doomed.len(),
        quads: quads_before + doomed.len(),
    };
    debug!(
        "quadification deleted {} edges: {} triangles, {} quads",
        report.edges_deleted, report.triangles, report.quads
    );
    Ok(report)
}

/// [`quadification`] with a [`StdRng`] seeded from `seed`.
pub fn quadification_seeded(graph: &mut Graph, seed: u64) -> Result<QuadifyReport> {
    let mut rng = StdRng::seed_from_u64(seed);
    quadification(graph, &mut rng)
}
