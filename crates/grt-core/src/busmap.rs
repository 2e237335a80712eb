//! Busmaps: finite mappings from bus names to representative bus names.
//!
//! Every reduction stage emits a busmap describing where each of its input
//! buses ended up. Chaining stages means composing busmaps, so composition is
//! defined here as an explicit operator and tested independently of any
//! stage: `a.compose(&b)` first applies `a`, then maps each target through
//! `b`. Composition is associative, and composing a chain of stage busmaps
//! yields the same mapping as applying them one at a time.

use crate::{GrtError, GrtResult, Network};
use std::collections::{BTreeMap, BTreeSet};

/// A total mapping from pre-reduction bus names to post-reduction bus names.
///
/// Buses absent from the map are treated as mapping to themselves, so the
/// mapping is total over any bus set. Iteration order is deterministic
/// (sorted by bus name), which keeps persisted busmap files reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Busmap {
    map: BTreeMap<String, String>,
}

impl Busmap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The identity busmap over all buses of a network.
    pub fn identity(network: &Network) -> Self {
        let map = network
            .buses()
            .iter()
            .map(|b| (b.name.clone(), b.name.clone()))
            .collect();
        Self { map }
    }

    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.map.insert(from.into(), to.into());
    }

    pub fn get(&self, bus: &str) -> Option<&str> {
        self.map.get(bus).map(String::as_str)
    }

    /// Representative of `bus`; buses not in the map represent themselves.
    pub fn apply<'a>(&'a self, bus: &'a str) -> &'a str {
        self.get(bus).unwrap_or(bus)
    }

    /// Compose with a later mapping: the result maps `b` to
    /// `other.apply(self.apply(b))`.
    pub fn compose(&self, other: &Busmap) -> Busmap {
        let mut map: BTreeMap<String, String> = self
            .map
            .iter()
            .map(|(from, to)| (from.clone(), other.apply(to).to_string()))
            .collect();
        // Buses introduced in the later stage that this stage never saw.
        for (from, to) in &other.map {
            map.entry(from.clone()).or_insert_with(|| to.clone());
        }
        Busmap { map }
    }

    /// Compose a chain of busmaps, earliest first.
    pub fn compose_chain(maps: &[Busmap]) -> Busmap {
        match maps.split_first() {
            None => Busmap::new(),
            Some((first, rest)) => rest.iter().fold(first.clone(), |acc, m| acc.compose(m)),
        }
    }

    /// The set of representative buses.
    pub fn image(&self) -> BTreeSet<&str> {
        self.map.values().map(String::as_str).collect()
    }

    pub fn is_identity(&self) -> bool {
        self.map.iter().all(|(from, to)| from == to)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Check that every bus of `network` is covered and every representative
    /// names an existing bus in `target`.
    pub fn validate(&self, network: &Network, target: &Network) -> GrtResult<()> {
        let targets: BTreeSet<&str> = target.buses().iter().map(|b| b.name.as_str()).collect();
        for bus in network.buses() {
            let mapped = self.apply(&bus.name);
            if !targets.contains(mapped) {
                return Err(GrtError::Validation(format!(
                    "busmap sends `{}` to `{mapped}`, which does not exist in the reduced network",
                    bus.name
                )));
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, String)> for Busmap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Busmap {
            map: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> Busmap {
        pairs
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn test_apply_defaults_to_identity() {
        let m = map(&[("a", "b")]);
        assert_eq!(m.apply("a"), "b");
        assert_eq!(m.apply("z"), "z");
    }

    #[test]
    fn test_compose_chains_targets() {
        let first = map(&[("a", "b"), ("b", "b"), ("c", "c")]);
        let second = map(&[("b", "x"), ("c", "x")]);
        let composed = first.compose(&second);

        assert_eq!(composed.apply("a"), "x");
        assert_eq!(composed.apply("b"), "x");
        assert_eq!(composed.apply("c"), "x");
    }

    #[test]
    fn test_compose_is_associative() {
        let m1 = map(&[("a", "b"), ("d", "d")]);
        let m2 = map(&[("b", "c"), ("d", "e")]);
        let m3 = map(&[("c", "z"), ("e", "z")]);

        let left = m1.compose(&m2).compose(&m3);
        let right = m1.compose(&m2.compose(&m3));
        assert_eq!(left, right);
    }

    #[test]
    fn test_compose_chain_equals_stepwise() {
        let maps = [
            map(&[("a", "b"), ("c", "c")]),
            map(&[("b", "c")]),
            map(&[("c", "k")]),
        ];
        let composed = Busmap::compose_chain(&maps);

        for bus in ["a", "b", "c"] {
            let mut stepwise = bus.to_string();
            for m in &maps {
                stepwise = m.apply(&stepwise).to_string();
            }
            assert_eq!(composed.apply(bus), stepwise, "bus {bus}");
        }
        assert_eq!(composed.apply("a"), "k");
    }

    #[test]
    fn test_identity_detection() {
        let m = map(&[("a", "a"), ("b", "b")]);
        assert!(m.is_identity());
        let m = map(&[("a", "b")]);
        assert!(!m.is_identity());
    }

    #[test]
    fn test_image() {
        let m = map(&[("a", "x"), ("b", "x"), ("c", "y")]);
        let image: Vec<&str> = m.image().into_iter().collect();
        assert_eq!(image, vec!["x", "y"]);
    }
}
