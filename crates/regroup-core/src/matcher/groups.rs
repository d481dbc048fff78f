use ahash::AHashMap;
use tracing::debug;

use super::tiers::{normalize_name, PairScore};
use crate::model::{FolderRecord, MatchGroup};

/// An edge between two folders whose pairwise score cleared the threshold.
#[derive(Debug, Clone, Copy)]
struct Edge {
    a: usize,
    b: usize,
    score: PairScore,
}

/// Cluster folders into match groups using `scorer` for every unordered pair.
///
/// Folders joined by an edge (score ≥ `min_confidence`) end up in the same
/// group, and so does anything reachable through a chain of edges: a group is a
/// connected component, not a clique. A pair only forms an edge when a tier
/// actually fired.
pub fn group_folders_with<F>(
    folders: &[FolderRecord],
    min_confidence: f64,
    scorer: F,
) -> Vec<MatchGroup>
where
    F: Fn(&str, &str) -> Option<PairScore>,
{
    let n = folders.len();
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut edges: Vec<Edge> = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            let Some(score) = scorer(&folders[i].name, &folders[j].name) else {
                continue;
            };
            if score.score >= min_confidence {
                adjacency[i].push(j);
                adjacency[j].push(i);
                edges.push(Edge { a: i, b: j, score });
            }
        }
    }

    debug!(
        "{} folders, {} edges at min_confidence {:.1}",
        n,
        edges.len(),
        min_confidence
    );

    // Label connected components with an iterative DFS.
    let mut component = vec![usize::MAX; n];
    let mut components: Vec<Vec<usize>> = Vec::new();
    for start in 0..n {
        if component[start] != usize::MAX || adjacency[start].is_empty() {
            continue;
        }
        let id = components.len();
        let mut members = Vec::new();
        let mut stack = vec![start];
        component[start] = id;
        while let Some(node) = stack.pop() {
            members.push(node);
            for &next in &adjacency[node] {
                if component[next] == usize::MAX {
                    component[next] = id;
                    stack.push(next);
                }
            }
        }
        members.sort_unstable();
        components.push(members);
    }

    let mut strongest: AHashMap<usize, PairScore> = AHashMap::new();
    for edge in &edges {
        debug_assert_eq!(component[edge.a], component[edge.b]);
        strongest
            .entry(component[edge.a])
            .and_modify(|best| {
                if edge.score.score > best.score {
                    *best = edge.score;
                }
            })
            .or_insert(edge.score);
    }

    let mut groups: Vec<MatchGroup> = components
        .into_iter()
        .enumerate()
        .filter(|(_, members)| members.len() >= 2)
        .filter_map(|(id, members)| {
            let best = *strongest.get(&id)?;
            let shortest = members
                .iter()
                .map(|&i| &folders[i])
                .min_by(|x, y| x.name.len().cmp(&y.name.len()).then_with(|| x.name.cmp(&y.name)))?;
            let base_name = normalize_name(&shortest.name);
            Some(MatchGroup {
                folders: members.iter().map(|&i| folders[i].clone()).collect(),
                confidence: best.score,
                match_reason: best.reason,
                base_name,
            })
        })
        .collect();

    groups.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.base_name.cmp(&b.base_name))
    });
    groups
}
