use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::utils::stable_hash;

/// A genome taking part in a breakpoint graph. Identity is the name alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Genome {
    name: String,
}

impl Genome {
    pub fn new(name: impl Into<String>) -> Self {
        Genome { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn json_id(&self) -> u64 {
        stable_hash(&self.name)
    }

    pub fn to_json(&self) -> Value {
        let mut value = json!(self);
        value["g_id"] = json!(self.json_id());
        value
    }

    /// Read a genome back from `{"name": ...}`; any other keys are ignored.
    pub fn from_json(value: &Value) -> Option<Genome> {
        Genome::deserialize(value).ok()
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for Genome {
    fn from(name: &str) -> Self {
        Genome::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genomes_with_same_name_are_equal() {
        assert_eq!(Genome::new("mouse"), Genome::new("mouse"));
        assert_ne!(Genome::new("mouse"), Genome::new("human"));
    }

    #[test]
    fn json_id_follows_name() {
        let genome = Genome::new("mouse");
        assert_eq!(genome.json_id(), Genome::new("mouse").json_id());
        assert_ne!(genome.json_id(), Genome::new("rat").json_id());
    }

    #[test]
    fn json_round_trip_needs_a_name() {
        let genome = Genome::new("rat");
        let value = genome.to_json();
        assert_eq!(value["g_id"], json!(genome.json_id()));
        assert_eq!(Genome::from_json(&value), Some(genome));
        assert_eq!(Genome::from_json(&json!({"g_id": 1})), None);
        assert_eq!(Genome::from_json(&json!({"name": 7})), None);
        assert_eq!(
            Genome::from_json(&json!({"name": "rat", "color": "red"})),
            Some(Genome::new("rat"))
        );
    }
}
