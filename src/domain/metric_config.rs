// User-selected metrics and the axis each one is drawn against
use super::metric::MetricKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSetting {
    pub axis: Axis,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricConfig(BTreeMap<MetricKey, MetricSetting>);

impl Default for MetricConfig {
    fn default() -> Self {
        let mut config = Self::empty();
        config.set(MetricKey::StateOfCharge, Axis::Left);
        config.set(MetricKey::Current, Axis::Right);
        config
    }
}

impl MetricConfig {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn set(&mut self, key: MetricKey, axis: Axis) {
        self.0.insert(key, MetricSetting { axis });
    }

    pub fn remove(&mut self, key: MetricKey) -> bool {
        self.0.remove(&key).is_some()
    }

    pub fn axis_of(&self, key: MetricKey) -> Option<Axis> {
        self.0.get(&key).map(|s| s.axis)
    }

    pub fn active(&self) -> impl Iterator<Item = (MetricKey, Axis)> + '_ {
        self.0.iter().map(|(k, s)| (*k, s.axis))
    }

    pub fn on_axis(&self, axis: Axis) -> impl Iterator<Item = MetricKey> + '_ {
        self.active().filter(move |(_, a)| *a == axis).map(|(k, _)| k)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_assignment() {
        let config = MetricConfig::default();
        assert_eq!(config.axis_of(MetricKey::StateOfCharge), Some(Axis::Left));
        assert_eq!(config.axis_of(MetricKey::Current), Some(Axis::Right));
        assert_eq!(config.axis_of(MetricKey::Clouds), None);
    }

    #[test]
    fn test_reassign_moves_axis() {
        let mut config = MetricConfig::default();
        config.set(MetricKey::Current, Axis::Left);
        let left: Vec<_> = config.on_axis(Axis::Left).collect();
        assert_eq!(left, vec![MetricKey::Current, MetricKey::StateOfCharge]);
        assert_eq!(config.on_axis(Axis::Right).count(), 0);
        assert!(config.remove(MetricKey::Current));
        assert!(!config.remove(MetricKey::Current));
    }

    #[test]
    fn test_serializes_as_key_map() {
        let json = serde_json::to_value(MetricConfig::default()).unwrap();
        assert_eq!(json["state_of_charge"]["axis"], "left");
    }
}
