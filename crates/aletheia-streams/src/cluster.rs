use std::collections::BTreeSet;

use crate::endpoint::BrokerGroup;
use crate::error::StreamsError;

/// Distinct clusters observed while registering the streams of one topology.
///
/// Only grows. A topology can be finalized from it only when it holds
/// exactly one cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterIdentitySet {
    clusters: BTreeSet<BrokerGroup>,
}

impl ClusterIdentitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cluster. Returns true if it was not seen before.
    pub fn add(&mut self, brokers: BrokerGroup) -> bool {
        self.clusters.insert(brokers)
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn contains(&self, brokers: &BrokerGroup) -> bool {
        self.clusters.contains(brokers)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BrokerGroup> {
        self.clusters.iter()
    }

    /// The single cluster every stream resides on.
    pub fn validate(&self) -> Result<&BrokerGroup, StreamsError> {
        let mut iter = self.iter();
        match (iter.next(), iter.next()) {
            (None, _) => Err(StreamsError::NoStreamsRegistered),
            (Some(only), None) => Ok(only),
            (Some(_), Some(_)) => Err(StreamsError::CrossClusterConfiguration(
                self.iter().map(ToString::to_string).collect(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn group(s: &str) -> BrokerGroup {
        s.parse().unwrap()
    }

    #[test]
    fn test_empty_set_fails_validation() {
        let set = ClusterIdentitySet::new();
        assert!(matches!(
            set.validate(),
            Err(StreamsError::NoStreamsRegistered)
        ));
    }

    #[test]
    fn test_same_cluster_counted_once() {
        let mut set = ClusterIdentitySet::new();

        assert!(set.add(group("b1:9092,b1:9093")));
        assert!(!set.add(group("b1:9093,b1:9092")));

        assert_eq!(set.len(), 1);
        assert_eq!(set.validate().unwrap(), &group("b1:9092,b1:9093"));
    }

    #[test]
    fn test_two_clusters_fail_validation() {
        let mut set = ClusterIdentitySet::new();
        set.add(group("b1:9092"));
        set.add(group("b2:9092"));

        match set.validate() {
            Err(StreamsError::CrossClusterConfiguration(clusters)) => {
                assert_eq!(clusters, vec!["b1:9092".to_string(), "b2:9092".to_string()]);
            }
            other => panic!("expected cross-cluster error, got {:?}", other),
        }
    }

    #[test]
    fn test_set_never_shrinks() {
        let mut set = ClusterIdentitySet::new();
        set.add(group("b1:9092"));
        set.add(group("b2:9092"));
        set.add(group("b1:9092"));

        assert_eq!(set.len(), 2);
        assert!(set.contains(&group("b2:9092")));
    }

    /// A broker list drawn from a small address pool, in random order and
    /// with random padding, so distinct lists often name the same cluster.
    fn broker_list() -> impl Strategy<Value = String> {
        proptest::sample::subsequence(vec!["b1:9092", "b1:9093", "b2:9092"], 1..=3)
            .prop_shuffle()
            .prop_flat_map(|addresses| {
                let n = addresses.len();
                (Just(addresses), proptest::collection::vec(" {0,2}", n))
            })
            .prop_map(|(addresses, padding)| {
                addresses
                    .iter()
                    .zip(padding)
                    .map(|(address, pad)| format!("{pad}{address}{pad}"))
                    .collect::<Vec<_>>()
                    .join(",")
            })
    }

    proptest! {
        #[test]
        fn prop_valid_exactly_when_one_cluster(
            lists in proptest::collection::vec(broker_list(), 0..8),
        ) {
            let mut set = ClusterIdentitySet::new();
            for list in &lists {
                set.add(group(list));
            }

            let distinct: BTreeSet<BTreeSet<String>> = lists
                .iter()
                .map(|list| list.split(',').map(|a| a.trim().to_string()).collect())
                .collect();

            prop_assert_eq!(set.len(), distinct.len());
            prop_assert_eq!(set.validate().is_ok(), distinct.len() == 1);
            match set.validate() {
                Ok(only) => prop_assert_eq!(only, set.iter().next().unwrap()),
                Err(StreamsError::NoStreamsRegistered) => prop_assert!(lists.is_empty()),
                Err(StreamsError::CrossClusterConfiguration(clusters)) => {
                    prop_assert_eq!(clusters.len(), distinct.len())
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }
    }
}
