//! Classification of loaded mappings
//!
//! Given the mappings that have content, in declaration order, a [`Plan`]
//! says which of them go into the repository and in which order, and which
//! of them contend without an override relation.
//!
//! 1.  **Grouping**: two mappings overlap if one's repository path equals or
//!     contains the other's. Groups are the connected components of that
//!     relation, so unrelated paths are planned independently.
//!
//! 2.  **Classification**: inside a group, every overlapping pair from
//!     different packages must be ordered by the override graph. Pairs that
//!     are not ordered contend; every mapping of a contending pair is left
//!     out of the repository.
//!
//! 3.  **Ordering**: the remaining mappings of a group are sorted so that
//!     overridden mappings come before overriding ones and, within one
//!     package, ancestors come before descendants. Ties are broken by depth,
//!     then declaration order. Groups are sorted the same way.
//!
//! 4.  **Clustering**: contending pairs are merged, shallowest first, into
//!     clusters that hold at most one mapping per package. Nested contention
//!     at `/a`, `/a/b` and `/a/b/c` therefore becomes a single cluster keyed
//!     by `/a`.

use std::collections::HashSet;

use crate::mapping::MappingKey;
use crate::override_graph::OverrideGraph;
use crate::path;

/// Outcome of classifying a set of mappings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Plan {
    /// Mappings to add, in add order
    pub enabled: Vec<MappingKey>,
    /// Groups of contending mappings
    pub clusters: Vec<Cluster>,
}

/// Mappings contending for a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Cluster {
    /// Common ancestor of the members' paths
    pub path: String,
    /// At most one mapping per package, in declaration order
    pub members: Vec<MappingKey>,
}

/// Classify `candidates`, given in declaration order
pub(crate) fn plan(candidates: &[MappingKey], graph: &OverrideGraph) -> Plan {
    let mut plan = Plan::default();

    for group in groups(candidates) {
        let contending_pairs = contending_pairs(candidates, &group, graph);
        let contending: HashSet<usize> = contending_pairs
            .iter()
            .flat_map(|&(i, j)| [i, j])
            .collect();

        let enabled: Vec<usize> = group
            .iter()
            .copied()
            .filter(|index| !contending.contains(index))
            .collect();

        plan.enabled.extend(
            order(candidates, &enabled, graph)
                .into_iter()
                .map(|index| candidates[index].clone()),
        );
        plan.clusters
            .extend(clusters(candidates, contending_pairs));
    }

    plan
}

fn depth_of(candidates: &[MappingKey], index: usize) -> usize {
    path::depth(&candidates[index].repository_path)
}

fn overlapping(candidates: &[MappingKey], i: usize, j: usize) -> bool {
    path::overlaps(&candidates[i].repository_path, &candidates[j].repository_path)
}

/// Connected components of the overlap relation, sorted by (depth, declaration)
fn groups(candidates: &[MappingKey]) -> Vec<Vec<usize>> {
    let mut parent: Vec<usize> = (0..candidates.len()).collect();

    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }

    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            if overlapping(candidates, i, j) {
                let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                if a != b {
                    parent[b] = a;
                }
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut group_of_root: Vec<Option<usize>> = vec![None; candidates.len()];
    for index in 0..candidates.len() {
        let root = find(&mut parent, index);
        match group_of_root[root] {
            Some(group) => groups[group].push(index),
            None => {
                group_of_root[root] = Some(groups.len());
                groups.push(vec![index]);
            }
        }
    }

    groups.sort_by_key(|group| {
        let depth = group.iter().map(|&i| depth_of(candidates, i)).min();
        (depth, group[0])
    });
    groups
}

/// Overlapping pairs from different packages with no override relation
fn contending_pairs(
    candidates: &[MappingKey],
    group: &[usize],
    graph: &OverrideGraph,
) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();

    for (position, &i) in group.iter().enumerate() {
        for &j in &group[position + 1..] {
            let (a, b) = (&candidates[i].package, &candidates[j].package);
            if a != b && overlapping(candidates, i, j) && !graph.is_ordered(a, b) {
                pairs.push((i, j));
            }
        }
    }

    pairs
}

/// Sort non-contending mappings of a group into add order
fn order(candidates: &[MappingKey], members: &[usize], graph: &OverrideGraph) -> Vec<usize> {
    let count = members.len();
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut indegree = vec![0usize; count];

    for a in 0..count {
        for b in (a + 1)..count {
            let (i, j) = (members[a], members[b]);
            if !overlapping(candidates, i, j) {
                continue;
            }

            let (pi, pj) = (&candidates[i].package, &candidates[j].package);
            let i_first = if pi == pj {
                depth_of(candidates, i) <= depth_of(candidates, j)
            } else {
                graph.overrides(pj, pi)
            };

            let (first, second) = if i_first { (a, b) } else { (b, a) };
            successors[first].push(second);
            indegree[second] += 1;
        }
    }

    let rank = |position: usize| (depth_of(candidates, members[position]), members[position]);
    let mut done = vec![false; count];
    let mut ordered = Vec::with_capacity(count);

    while ordered.len() < count {
        let ready = (0..count)
            .filter(|&position| !done[position] && indegree[position] == 0)
            .min_by_key(|&position| rank(position));

        // Mixing declared overrides with the root's order can form a cycle;
        // fall back to the best-ranked remaining mapping.
        let next = match ready {
            Some(position) => position,
            None => match (0..count)
                .filter(|&position| !done[position])
                .min_by_key(|&position| rank(position))
            {
                Some(position) => position,
                None => break,
            },
        };

        done[next] = true;
        ordered.push(members[next]);
        for &successor in &successors[next] {
            indegree[successor] = indegree[successor].saturating_sub(1);
        }
    }

    ordered
}

/// Merge contending pairs into clusters with one mapping per package
fn clusters(candidates: &[MappingKey], mut pairs: Vec<(usize, usize)>) -> Vec<Cluster> {
    pairs.sort_by_key(|&(i, j)| {
        (
            depth_of(candidates, i).min(depth_of(candidates, j)),
            i,
            j,
        )
    });

    let has_package = |members: &[usize], package: &str| {
        members
            .iter()
            .any(|&index| candidates[index].package == package)
    };

    let mut clusters: Vec<Vec<usize>> = Vec::new();

    for (i, j) in pairs {
        if clusters
            .iter()
            .any(|members| members.contains(&i) && members.contains(&j))
        {
            continue;
        }

        let cluster_i = clusters.iter().position(|members| members.contains(&i));
        let cluster_j = clusters.iter().position(|members| members.contains(&j));

        match (cluster_i, cluster_j) {
            (Some(a), Some(b)) => {
                let disjoint = clusters[b]
                    .iter()
                    .all(|&index| !has_package(&clusters[a], &candidates[index].package));
                if disjoint {
                    let moved = clusters.remove(b);
                    let a = if a > b { a - 1 } else { a };
                    clusters[a].extend(moved);
                } else {
                    clusters.push(vec![i, j]);
                }
            }
            (Some(a), None) if !has_package(&clusters[a], &candidates[j].package) => {
                clusters[a].push(j)
            }
            (None, Some(b)) if !has_package(&clusters[b], &candidates[i].package) => {
                clusters[b].push(i)
            }
            _ => clusters.push(vec![i, j]),
        }
    }

    clusters
        .into_iter()
        .map(|mut members| {
            members.sort_unstable();
            Cluster {
                path: path::common_ancestor(
                    members
                        .iter()
                        .map(|&index| candidates[index].repository_path.as_str()),
                ),
                members: members
                    .into_iter()
                    .map(|index| candidates[index].clone())
                    .collect(),
            }
        })
        .collect()
}
