//! Office definitions and the validated, immutable office catalog.

use crate::{
    character::SocialClass,
    error::{SimError, SimResult},
    types::OfficeId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// The voting body an office is elected by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assembly {
    /// Comitia centuriata — elects the senior magistrates.
    Centuriate,
    /// Comitia tributa — elects quaestors and curule aediles.
    Tribal,
    /// Concilium plebis — elects tribunes and plebeian aediles.
    PlebeianCouncil,
}

/// Ambition bonus a social class receives when standing before an assembly.
/// Equestrians get their flat bonus regardless of assembly.
const STATUS_AFFINITY: &[(SocialClass, Option<Assembly>, f64)] = &[
    (SocialClass::Patrician, Some(Assembly::Centuriate), 6.0),
    (SocialClass::Plebeian, Some(Assembly::PlebeianCouncil), 6.0),
    (SocialClass::Equestrian, None, 3.0),
];

impl Assembly {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Centuriate => "Comitia Centuriata",
            Self::Tribal => "Comitia Tributa",
            Self::PlebeianCouncil => "Concilium Plebis",
        }
    }

    pub fn is_centuriate(&self) -> bool {
        matches!(self, Self::Centuriate)
    }

    pub fn status_affinity(&self, class: SocialClass) -> f64 {
        STATUS_AFFINITY
            .iter()
            .find(|(c, a, _)| *c == class && a.map_or(true, |a| a == *self))
            .map(|(_, _, bonus)| *bonus)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficeDefinition {
    pub id: OfficeId,
    pub name: String,
    pub assembly: Assembly,
    pub min_age: u32,
    pub term_length_years: u32,
    pub seats: u32,
    #[serde(default)]
    pub reelection_gap_years: u32,
    pub rank: u32,
    /// Offices that must have been completed before standing for this one.
    #[serde(default)]
    pub prerequisites_all: BTreeSet<OfficeId>,
}

/// Every office of the run, validated once at load and never mutated.
#[derive(Debug, Clone)]
pub struct OfficeCatalog {
    definitions: Vec<OfficeDefinition>,
    index:       HashMap<OfficeId, usize>,
}

impl OfficeCatalog {
    /// Validate and index a list of definitions. Any malformed definition
    /// aborts the load.
    pub fn new(definitions: Vec<OfficeDefinition>) -> SimResult<Self> {
        let mut index = HashMap::with_capacity(definitions.len());
        for (i, def) in definitions.iter().enumerate() {
            if def.id.trim().is_empty() {
                return Err(SimError::validation(format!("office #{i} has an empty id")));
            }
            if def.seats == 0 {
                return Err(SimError::validation(format!(
                    "office '{}' must have at least one seat",
                    def.id
                )));
            }
            if def.term_length_years == 0 {
                return Err(SimError::validation(format!(
                    "office '{}' must have a term of at least one year",
                    def.id
                )));
            }
            if index.insert(def.id.clone(), i).is_some() {
                return Err(SimError::validation(format!("duplicate office id '{}'", def.id)));
            }
        }

        for def in &definitions {
            for prereq in &def.prerequisites_all {
                if !index.contains_key(prereq) {
                    return Err(SimError::validation(format!(
                        "office '{}' requires unknown office '{prereq}'",
                        def.id
                    )));
                }
                if prereq == &def.id {
                    return Err(SimError::validation(format!(
                        "office '{}' lists itself as a prerequisite",
                        def.id
                    )));
                }
            }
        }

        log::info!("office catalog: {} office(s) loaded", definitions.len());
        Ok(Self { definitions, index })
    }

    pub fn get(&self, office_id: &str) -> Option<&OfficeDefinition> {
        self.index.get(office_id).map(|&i| &self.definitions[i])
    }

    pub fn contains(&self, office_id: &str) -> bool {
        self.index.contains_key(office_id)
    }

    pub fn name_of(&self, office_id: &str) -> Option<&str> {
        self.get(office_id).map(|d| d.name.as_str())
    }

    /// Definitions in load order.
    pub fn definitions(&self) -> &[OfficeDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
