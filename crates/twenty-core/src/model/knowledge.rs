//! Static attribute table the guessers reason over.
//!
//! The table is loaded once and never mutated. Entities and attributes are kept
//! in lexicographic order so every walk over the table is deterministic.

use super::truth::Truth;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// On-disk shape: `{ "dog": { "hasFur": true, "livesInWater": null } }`.
/// A missing key and an explicit `null` both mean "not recorded".
pub type ProfileTable = BTreeMap<String, BTreeMap<String, Option<bool>>>;

#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeBase {
    entities: Vec<String>,
    attributes: Vec<String>,
    entity_lookup: HashMap<String, usize>,
    attribute_lookup: HashMap<String, usize>,
    // Row-major: entities.len() rows of attributes.len() values.
    table: Vec<Truth>,
}

impl KnowledgeBase {
    /// Load a knowledge base from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, KnowledgeError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| KnowledgeError::Read {
            source,
            path: path.to_path_buf(),
        })?;
        let table: ProfileTable =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| {
                KnowledgeError::Parse {
                    source,
                    path: Some(path.to_path_buf()),
                }
            })?;
        let kb = Self::from_table(table)?;
        tracing::debug!(
            path = %path.display(),
            entities = kb.len(),
            attributes = kb.attribute_count(),
            "knowledge base loaded"
        );
        Ok(kb)
    }

    pub fn from_json_str(json: &str) -> Result<Self, KnowledgeError> {
        let table: ProfileTable = serde_json::from_str(json)
            .map_err(|source| KnowledgeError::Parse { source, path: None })?;
        Self::from_table(table)
    }

    pub fn from_table(table: ProfileTable) -> Result<Self, KnowledgeError> {
        Self::from_rows(table)
    }

    /// Build a knowledge base from `(entity, [(attribute, value)])` rows.
    ///
    /// Values may be anything convertible into [`Truth`] (`bool`,
    /// `Option<bool>` or `Truth` itself). Duplicate entity names are rejected;
    /// a duplicate attribute within one row keeps the last value.
    pub fn from_rows<E, P, A, T>(rows: impl IntoIterator<Item = (E, P)>) -> Result<Self, KnowledgeError>
    where
        E: Into<String>,
        P: IntoIterator<Item = (A, T)>,
        A: Into<String>,
        T: Into<Truth>,
    {
        let mut profiles: BTreeMap<String, BTreeMap<String, Truth>> = BTreeMap::new();
        for (entity, profile) in rows {
            let entity = entity.into();
            if entity.trim().is_empty() {
                return Err(KnowledgeError::EmptyEntityName);
            }
            let mut values = BTreeMap::new();
            for (attribute, value) in profile {
                let attribute = attribute.into();
                if attribute.trim().is_empty() {
                    return Err(KnowledgeError::EmptyAttributeName { entity });
                }
                values.insert(attribute, value.into());
            }
            if profiles.insert(entity.clone(), values).is_some() {
                return Err(KnowledgeError::DuplicateEntity(entity));
            }
        }

        let mut attributes: Vec<String> = profiles
            .values()
            .flat_map(|profile| profile.keys().cloned())
            .collect();
        attributes.sort();
        attributes.dedup();

        let attribute_lookup: HashMap<String, usize> = attributes
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        let mut entities = Vec::with_capacity(profiles.len());
        let mut table = vec![Truth::Unknown; profiles.len() * attributes.len()];
        for (row, (entity, profile)) in profiles.into_iter().enumerate() {
            for (attribute, value) in profile {
                let col = attribute_lookup[&attribute];
                table[row * attributes.len() + col] = value;
            }
            entities.push(entity);
        }

        let entity_lookup = entities
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        Ok(Self {
            entities,
            attributes,
            entity_lookup,
            attribute_lookup,
            table,
        })
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn entity_name(&self, entity: usize) -> &str {
        &self.entities[entity]
    }

    pub fn attribute_name(&self, attribute: usize) -> &str {
        &self.attributes[attribute]
    }

    pub fn entity_index(&self, name: &str) -> Option<usize> {
        self.entity_lookup.get(name).copied()
    }

    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attribute_lookup.get(name).copied()
    }

    pub fn contains_entity(&self, name: &str) -> bool {
        self.entity_lookup.contains_key(name)
    }

    /// Recorded value by index. Panics on out-of-range indices.
    pub fn truth(&self, entity: usize, attribute: usize) -> Truth {
        self.table[entity * self.attributes.len() + attribute]
    }

    /// Recorded value by name; anything not in the table is `Unknown`.
    pub fn value(&self, entity: &str, attribute: &str) -> Truth {
        match (self.entity_index(entity), self.attribute_index(attribute)) {
            (Some(e), Some(a)) => self.truth(e, a),
            _ => Truth::Unknown,
        }
    }

    /// Attributes with a recorded (true or false) value for `entity`.
    pub fn known_attributes(&self, entity: usize) -> impl Iterator<Item = usize> + '_ {
        let width = self.attributes.len();
        self.table[entity * width..(entity + 1) * width]
            .iter()
            .enumerate()
            .filter(|(_, truth)| truth.is_known())
            .map(|(idx, _)| idx)
    }
}

/// Errors surfaced while loading a knowledge base. Any of these prevents a
/// session from being created.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("failed to read knowledge base {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    /// `path` is `None` when the JSON came from an in-memory string.
    #[error("failed to parse knowledge base{}: {source}", describe_path(.path))]
    Parse {
        #[source]
        source: serde_json::Error,
        path: Option<PathBuf>,
    },
    #[error("entity name must not be empty")]
    EmptyEntityName,
    #[error("entity '{entity}' has an attribute with an empty name")]
    EmptyAttributeName { entity: String },
    #[error("entity '{0}' defined more than once")]
    DuplicateEntity(String),
}

fn describe_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|path| format!(" {path:?}"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "shark": { "hasFur": false, "isDomestic": false, "isPredator": true },
        "dog":   { "hasFur": true,  "isDomestic": true,  "isPredator": true },
        "cow":   { "hasFur": true,  "isDomestic": true,  "isPredator": false, "laysEggs": null }
    }"#;

    #[test]
    fn entities_and_attributes_are_sorted() {
        let kb = KnowledgeBase::from_json_str(SAMPLE).unwrap();
        assert_eq!(kb.entities(), ["cow", "dog", "shark"]);
        assert_eq!(kb.attributes(), ["hasFur", "isDomestic", "isPredator", "laysEggs"]);
    }

    #[test]
    fn null_and_missing_values_are_unknown() {
        let kb = KnowledgeBase::from_json_str(SAMPLE).unwrap();
        assert_eq!(kb.value("cow", "laysEggs"), Truth::Unknown);
        assert_eq!(kb.value("dog", "laysEggs"), Truth::Unknown);
        assert_eq!(kb.value("cow", "isPredator"), Truth::False);
        assert_eq!(kb.value("unicorn", "hasFur"), Truth::Unknown);
        assert_eq!(kb.value("dog", "canFly"), Truth::Unknown);
    }

    #[test]
    fn known_attributes_skip_unknown_cells() {
        let kb = KnowledgeBase::from_json_str(SAMPLE).unwrap();
        let cow = kb.entity_index("cow").unwrap();
        let known: Vec<&str> = kb
            .known_attributes(cow)
            .map(|idx| kb.attribute_name(idx))
            .collect();
        assert_eq!(known, ["hasFur", "isDomestic", "isPredator"]);
    }

    #[test]
    fn rows_accept_mixed_value_types() {
        let kb = KnowledgeBase::from_rows([
            ("owl", vec![("canFly", Truth::True), ("isNocturnal", Truth::True)]),
            ("emu", vec![("canFly", Truth::False), ("isNocturnal", Truth::Unknown)]),
        ])
        .unwrap();
        assert_eq!(kb.len(), 2);
        assert_eq!(kb.value("emu", "isNocturnal"), Truth::Unknown);

        let kb = KnowledgeBase::from_rows([("cat", [("hasFur", true)])]).unwrap();
        assert_eq!(kb.value("cat", "hasFur"), Truth::True);
    }

    #[test]
    fn rejects_duplicate_and_empty_names() {
        let err = KnowledgeBase::from_rows([("cat", [("hasFur", true)]), ("cat", [("hasFur", false)])])
            .unwrap_err();
        assert!(matches!(err, KnowledgeError::DuplicateEntity(name) if name == "cat"));

        let err = KnowledgeBase::from_rows([(" ", [("hasFur", true)])]).unwrap_err();
        assert!(matches!(err, KnowledgeError::EmptyEntityName));

        let err = KnowledgeBase::from_rows([("cat", [("", true)])]).unwrap_err();
        assert!(matches!(err, KnowledgeError::EmptyAttributeName { entity } if entity == "cat"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = KnowledgeBase::from_json_str(r#"{ "dog": { "hasFur": "yes" } }"#).unwrap_err();
        assert!(matches!(err, KnowledgeError::Parse { path: None, .. }));
        assert!(err.to_string().starts_with("failed to parse knowledge base: "));
        assert!(KnowledgeBase::from_json_str("[1, 2, 3]").is_err());
    }

    #[test]
    fn empty_object_is_an_empty_base() {
        let kb = KnowledgeBase::from_json_str("{}").unwrap();
        assert!(kb.is_empty());
        assert_eq!(kb.attribute_count(), 0);
    }
}
