//! Override relation between packages
//!
//! Every package may declare the packages it overrides. Those declarations
//! form a directed graph with an edge `A -> B` for "A overrides B". A package
//! overrides another if it reaches it in that graph and is not reached back:
//! a declared cycle means neither side wins, and their mappings conflict.
//!
//! Packages with no declared relation either way may still be ordered by the
//! root package's `override-order` list, provided both names appear in it.
//! The package listed later overrides the one listed earlier.

use std::collections::{HashMap, HashSet};

use crate::package::PackageSet;

/// Answers "do A's mappings take precedence over B's"
#[derive(Debug, Clone, Default)]
pub struct OverrideGraph {
    edges: HashMap<String, Vec<String>>,
    reachable: HashMap<String, HashSet<String>>,
    order: HashMap<String, usize>,
}

impl OverrideGraph {
    /// Build the graph from every package's declarations and the root's order
    pub fn new(packages: &PackageSet) -> Self {
        let mut graph = Self::default();

        for package in packages.iter() {
            for overridden in package.overridden_package_names() {
                graph.add_edge(package.name(), overridden);
            }
        }

        for (position, name) in packages.root().override_order().iter().enumerate() {
            graph.order.entry(name.clone()).or_insert(position);
        }

        graph.compute_closure();
        graph
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        let targets = self.edges.entry(from.to_string()).or_default();
        if !targets.iter().any(|target| target == to) {
            targets.push(to.to_string());
        }
    }

    fn compute_closure(&mut self) {
        let mut reachable = HashMap::new();

        for start in self.edges.keys() {
            let mut seen = HashSet::new();
            let mut stack: Vec<&str> = vec![start.as_str()];

            while let Some(current) = stack.pop() {
                for next in self.edges.get(current).into_iter().flatten() {
                    if seen.insert(next.clone()) {
                        stack.push(next);
                    }
                }
            }

            reachable.insert(start.clone(), seen);
        }

        self.reachable = reachable;
    }

    /// Whether `from` reaches `to` through declared override edges
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        self.reachable
            .get(from)
            .is_some_and(|targets| targets.contains(to))
    }

    /// Whether `a`'s mappings override `b`'s mappings
    pub fn overrides(&self, a: &str, b: &str) -> bool {
        if a == b {
            return false;
        }

        match (self.has_path(a, b), self.has_path(b, a)) {
            (true, false) => true,
            (false, true) => false,
            // A cycle: neither side wins.
            (true, true) => false,
            (false, false) => match (self.order.get(a), self.order.get(b)) {
                (Some(position_a), Some(position_b)) => position_a > position_b,
                _ => false,
            },
        }
    }

    /// Whether one of the two packages overrides the other
    pub fn is_ordered(&self, a: &str, b: &str) -> bool {
        self.overrides(a, b) || self.overrides(b, a)
    }
}
