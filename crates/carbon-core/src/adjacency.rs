//! Symmetric touching relation over an ordered parcel sequence.
//!
//! Stored sparsely as a sorted neighbour list per index. Candidate pairs are
//! found with a sort-and-sweep over bounding rectangles; only candidates are
//! handed to the exact predicate, so the result is identical to testing every
//! pair.

use geo::{Polygon, Rect};
#[cfg(feature = "threading")]
use rayon::prelude::*;

use crate::error::{Result, SelectionError};
use crate::geometry;

/// Symmetric, irreflexive relation over `0..len()`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Adjacency {
    neighbors: Vec<Vec<usize>>,
}

impl Adjacency {
    /// Relation over `n` indices with no adjacent pairs.
    pub fn empty(n: usize) -> Self {
        Self { neighbors: vec![Vec::new(); n] }
    }

    /// Build from unordered pairs. Duplicates and either orientation are
    /// accepted; self-pairs and out-of-range indices are not.
    pub fn from_pairs(n: usize, pairs: impl IntoIterator<Item = (usize, usize)>) -> Result<Self> {
        let mut neighbors = vec![Vec::new(); n];
        for (i, j) in pairs {
            if i == j {
                return Err(SelectionError::InvalidParameter(format!(
                    "parcel {i} cannot be adjacent to itself"
                )));
            }
            if i >= n || j >= n {
                return Err(SelectionError::InvalidParameter(format!(
                    "adjacent pair ({i}, {j}) is out of range for {n} parcels"
                )));
            }
            neighbors[i].push(j);
            neighbors[j].push(i);
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }
        Ok(Self { neighbors })
    }

    /// Number of parcels the relation is defined over.
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    pub fn are_adjacent(&self, i: usize, j: usize) -> bool {
        self.neighbors
            .get(i)
            .is_some_and(|list| list.binary_search(&j).is_ok())
    }

    /// Sorted indices adjacent to `i`; empty when `i` is out of range.
    pub fn neighbors(&self, i: usize) -> &[usize] {
        self.neighbors.get(i).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Each unordered adjacent pair exactly once, as `(i, j)` with `i < j`,
    /// in ascending order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.neighbors.iter().enumerate().flat_map(|(i, list)| {
            list.iter().copied().filter(move |&j| j > i).map(move |j| (i, j))
        })
    }

    pub fn pair_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum::<usize>() / 2
    }
}

/// Compute which parcels touch each other.
///
/// Every geometry is validated before any predicate is evaluated; the first
/// invalid geometry aborts the build with its index.
pub fn build_adjacency(geometries: &[Polygon<f64>]) -> Result<Adjacency> {
    let envelopes = geometries
        .iter()
        .enumerate()
        .map(|(i, g)| geometry::validate(i, g))
        .collect::<Result<Vec<_>>>()?;

    let candidates = candidate_pairs(&envelopes);
    log::debug!(
        "{} candidate pairs of {} possible after envelope sweep",
        candidates.len(),
        geometries.len() * geometries.len().saturating_sub(1) / 2
    );

    let touching = evaluate(geometries, &candidates);
    let adjacency = Adjacency::from_pairs(geometries.len(), touching)?;
    log::info!(
        "adjacency: {} parcels, {} touching pairs",
        adjacency.len(),
        adjacency.pair_count()
    );
    Ok(adjacency)
}

/// Pairs `(i, j)`, `i < j`, whose closed envelopes meet.
fn candidate_pairs(envelopes: &[Rect<f64>]) -> Vec<(usize, usize)> {
    let mut order: Vec<usize> = (0..envelopes.len()).collect();
    order.sort_by(|&a, &b| envelopes[a].min().x.total_cmp(&envelopes[b].min().x));

    let mut pairs = Vec::new();
    for (pos, &i) in order.iter().enumerate() {
        let max_x = envelopes[i].max().x;
        for &j in &order[pos + 1..] {
            if envelopes[j].min().x > max_x {
                break;
            }
            if geometry::envelopes_meet(&envelopes[i], &envelopes[j]) {
                pairs.push((i.min(j), i.max(j)));
            }
        }
    }
    pairs.sort_unstable();
    pairs
}

#[cfg(not(feature = "threading"))]
fn evaluate(geometries: &[Polygon<f64>], candidates: &[(usize, usize)]) -> Vec<(usize, usize)> {
    candidates
        .iter()
        .copied()
        .filter(|&(i, j)| geometry::touches(&geometries[i], &geometries[j]))
        .collect()
}

#[cfg(feature = "threading")]
fn evaluate(geometries: &[Polygon<f64>], candidates: &[(usize, usize)]) -> Vec<(usize, usize)> {
    candidates
        .par_iter()
        .copied()
        .filter(|&(i, j)| geometry::touches(&geometries[i], &geometries[j]))
        .collect()
}
