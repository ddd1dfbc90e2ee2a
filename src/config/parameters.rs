use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::core::InfectiousnessProfile;
use crate::core::passing::DEFAULT_MAX_CONTACTS;
use crate::core::sampler::{DEFAULT_EPSILON, DEFAULT_TEMPERATURE};

/// Prior transmission rate per venue type, in the order they were given.
///
/// In YAML, priors are written as a mapping from venue type to rate; the order of the mapping
/// fixes the order of the model parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Priors(Vec<(String, f64)>);

impl Priors {
    pub fn as_slice(&self) -> &[(String, f64)] {
        &self.0
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Priors {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, rate)| (name.into(), rate))
                .collect(),
        )
    }
}

impl Serialize for Priors {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, rate) in &self.0 {
            map.serialize_entry(name, rate)?;
        }
        map.end()
    }
}

struct PriorsVisitor;

impl<'de> Visitor<'de> for PriorsVisitor {
    type Value = Priors;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a mapping from venue type to prior rate")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut priors = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, rate)) = access.next_entry::<String, f64>()? {
            priors.push((name, rate));
        }
        Ok(Priors(priors))
    }
}

impl<'de> Deserialize<'de> for Priors {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(PriorsVisitor)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModelParameters {
    /// Prior transmission rate of each venue type.
    pub priors: Priors,

    /// Assumed maximum number of effective contacts per agent and step in a venue.
    #[serde(default = "default_max_contacts")]
    pub max_contacts: f64,

    /// Temperature of the relaxed infection sampler.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Floor applied to probabilities before taking their logarithm.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Infectiousness as a function of time since infection.
    #[serde(default)]
    pub infectiousness: InfectiousnessProfile,

    /// Seed of the sampler's random number generator.
    #[serde(default)]
    pub seed: u64,
}

fn default_max_contacts() -> f64 {
    DEFAULT_MAX_CONTACTS
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_epsilon() -> f64 {
    DEFAULT_EPSILON
}

impl ModelParameters {
    /// Parameters with the given priors and defaults for everything else.
    pub fn with_priors(priors: Priors) -> Self {
        Self {
            priors,
            max_contacts: default_max_contacts(),
            temperature: default_temperature(),
            epsilon: default_epsilon(),
            infectiousness: InfectiousnessProfile::default(),
            seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priors_keep_document_order() {
        let yaml = "priors:\n  school: 20.0\n  company: 10.0\n  leisure: 1.5\n";
        let parameters: ModelParameters = serde_yaml::from_str(yaml).unwrap();
        let names: Vec<&str> = parameters.priors.names().collect();
        assert_eq!(names, vec!["school", "company", "leisure"]);
        assert_eq!(parameters.max_contacts, 5.);
        assert_eq!(parameters.temperature, 0.1);
        assert_eq!(parameters.infectiousness, InfectiousnessProfile::default());
    }

    #[test]
    fn read_write() {
        let mut parameters = ModelParameters::with_priors(Priors::from_iter([
            ("company", 10.),
            ("school", 20.),
        ]));
        parameters.infectiousness = InfectiousnessProfile::Constant { value: 0.5 };
        parameters.seed = 42;
        let yaml = serde_yaml::to_string(&parameters).unwrap();
        let read: ModelParameters = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(read, parameters);
    }
}
