//! Name-keyed dependency graph between models and parameters.
//!
//! An edge `consumer -> provider` means "if `provider` changes, `consumer` is
//! stale". Names need not refer to existing models: forward references and
//! parameter names are both legal providers.

use hashbrown::{HashMap, HashSet};

#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    providers: HashMap<String, HashSet<String>>,
    dependents: HashMap<String, HashSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `consumer -> provider`. Idempotent.
    ///
    /// # Errors
    /// Returns `Err(provider)` without changing the graph if the edge would
    /// close a cycle.
    pub fn register(&mut self, consumer: &str, provider: &str) -> Result<(), String> {
        if self.reaches(provider, consumer) {
            return Err(provider.to_string());
        }
        self.providers
            .entry(consumer.to_string())
            .or_default()
            .insert(provider.to_string());
        self.dependents
            .entry(provider.to_string())
            .or_default()
            .insert(consumer.to_string());
        Ok(())
    }

    /// Replaces every outgoing edge of `consumer` with edges to `providers`.
    ///
    /// # Errors
    /// Returns `Err(provider)` for the first provider that would close a
    /// cycle; the graph is left unchanged.
    pub fn set_dependencies(&mut self, consumer: &str, providers: &[String]) -> Result<(), String> {
        // Outgoing edges of `consumer` cannot lie on a path that ends at
        // `consumer`, so the check is valid against the current graph.
        if let Some(p) = providers.iter().find(|p| self.reaches(p, consumer)) {
            return Err(p.clone());
        }
        self.unregister(consumer);
        for provider in providers {
            self.register(consumer, provider)?;
        }
        Ok(())
    }

    /// Removes every outgoing edge of `consumer`. Edges from models that
    /// depend on `consumer` are kept.
    pub fn unregister(&mut self, consumer: &str) {
        let Some(providers) = self.providers.remove(consumer) else {
            return;
        };
        for provider in providers {
            if let Some(set) = self.dependents.get_mut(&provider) {
                set.remove(consumer);
                if set.is_empty() {
                    self.dependents.remove(&provider);
                }
            }
        }
    }

    /// Direct providers of `consumer`, sorted.
    pub fn providers_of(&self, consumer: &str) -> Vec<String> {
        sorted(self.providers.get(consumer))
    }

    /// Direct dependents of `provider`, sorted.
    pub fn dependents_of(&self, provider: &str) -> Vec<String> {
        sorted(self.dependents.get(provider))
    }

    /// Every name that depends on `provider` directly or transitively.
    ///
    /// # Complexity
    /// O(V + E) over the reachable subgraph.
    pub fn transitive_dependents(&self, provider: &str) -> Vec<String> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack = vec![provider];
        let mut out = Vec::new();
        while let Some(name) = stack.pop() {
            let Some(next) = self.dependents.get(name) else {
                continue;
            };
            for dependent in next {
                if visited.insert(dependent.as_str()) {
                    out.push(dependent.clone());
                    stack.push(dependent.as_str());
                }
            }
        }
        out
    }

    /// Whether `to` is reachable from `from` following consumer -> provider
    /// edges (a name always reaches itself).
    fn reaches(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack = vec![from];
        while let Some(name) = stack.pop() {
            let Some(next) = self.providers.get(name) else {
                continue;
            };
            for provider in next {
                if provider == to {
                    return true;
                }
                if visited.insert(provider.as_str()) {
                    stack.push(provider.as_str());
                }
            }
        }
        false
    }

    pub fn clear(&mut self) {
        self.providers.clear();
        self.dependents.clear();
    }
}

fn sorted(set: Option<&HashSet<String>>) -> Vec<String> {
    let mut v: Vec<String> = set.into_iter().flatten().cloned().collect();
    v.sort_unstable();
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn transitive_dependents_follow_chain() {
        let mut g = DependencyGraph::new();
        g.register("B", "A").unwrap();
        g.register("C", "B").unwrap();
        g.register("D", "A").unwrap();
        let mut deps = g.transitive_dependents("A");
        deps.sort();
        assert_eq!(deps, names(&["B", "C", "D"]));
        assert!(g.transitive_dependents("C").is_empty());
    }

    #[test]
    fn cycles_are_rejected() {
        let mut g = DependencyGraph::new();
        g.register("B", "A").unwrap();
        g.register("C", "B").unwrap();
        assert_eq!(g.register("A", "C"), Err("C".to_string()));
        assert_eq!(g.register("A", "A"), Err("A".to_string()));
        assert!(g.providers_of("A").is_empty());
    }

    #[test]
    fn set_dependencies_replaces_edges_atomically() {
        let mut g = DependencyGraph::new();
        g.set_dependencies("B", &names(&["A", "X"])).unwrap();
        g.set_dependencies("C", &names(&["B"])).unwrap();
        assert!(g.set_dependencies("B", &names(&["Y", "C"])).is_err());
        assert_eq!(g.providers_of("B"), names(&["A", "X"]));
        g.set_dependencies("B", &names(&["Y"])).unwrap();
        assert_eq!(g.providers_of("B"), names(&["Y"]));
        assert!(g.dependents_of("A").is_empty());
    }

    #[test]
    fn unregister_keeps_incoming_edges() {
        let mut g = DependencyGraph::new();
        g.register("B", "A").unwrap();
        g.register("C", "B").unwrap();
        g.unregister("B");
        assert!(g.dependents_of("A").is_empty());
        assert_eq!(g.dependents_of("B"), names(&["C"]));
    }
}
