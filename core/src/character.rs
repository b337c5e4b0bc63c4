//! Character collaborator boundary.
//!
//! The politics core never owns demographic data. It reads characters
//! through [`CharacterRepository`]; the in-memory implementation here backs
//! the runner and the test suite.

use crate::{
    context::IdAllocator,
    types::{CalendarDate, CharacterId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialClass {
    Patrician,
    Plebeian,
    Equestrian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

/// Read-only view of a character at the current date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id:           CharacterId,
    pub name:         String,
    pub age:          u32,
    pub gender:       Gender,
    pub social_class: SocialClass,
    pub wealth:       f64,
    pub influence:    f64,
    pub traits:       Vec<String>,
    pub alive:        bool,
    pub birth_month:  u8,
    pub birth_day:    u8,
}

impl Character {
    pub fn has_trait(&self, name: &str) -> bool {
        self.traits.iter().any(|t| t == name)
    }
}

pub trait CharacterRepository {
    fn get(&self, id: CharacterId) -> Option<Character>;

    /// Every living character, ascending by id.
    fn all_living(&self) -> Vec<Character>;

    /// Called by the engine before each day's events are delivered.
    fn sync_date(&mut self, _today: CalendarDate) {}
}

/// One roster entry as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub id:           CharacterId,
    pub name:         String,
    pub gender:       Gender,
    pub social_class: SocialClass,
    pub birth_year:   i32,
    pub birth_month:  u8,
    pub birth_day:    u8,
    #[serde(default)]
    pub wealth:       f64,
    #[serde(default)]
    pub influence:    f64,
    #[serde(default)]
    pub traits:       Vec<String>,
    #[serde(default = "default_alive")]
    pub alive:        bool,
}

fn default_alive() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct InMemoryCharacterRepository {
    records: BTreeMap<CharacterId, CharacterRecord>,
    today:   CalendarDate,
}

impl InMemoryCharacterRepository {
    pub fn new(records: Vec<CharacterRecord>, today: CalendarDate) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.id, r)).collect(),
            today,
        }
    }

    pub fn today(&self) -> CalendarDate {
        self.today
    }

    /// Ages are derived from the repository's date; keep it in step
    /// with the calendar.
    pub fn set_date(&mut self, today: CalendarDate) {
        self.today = today;
    }

    /// Insert a newborn (or any new record), assigning it a fresh id.
    pub fn add(&mut self, mut record: CharacterRecord, ids: &mut IdAllocator) -> CharacterId {
        let id = ids.next_id();
        record.id = id;
        self.records.insert(id, record);
        id
    }

    /// Mark a character dead. Returns false if unknown or already dead.
    pub fn kill(&mut self, id: CharacterId) -> bool {
        match self.records.get_mut(&id) {
            Some(record) if record.alive => {
                record.alive = false;
                true
            }
            _ => false,
        }
    }

    pub fn max_id(&self) -> Option<CharacterId> {
        self.records.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn age_of(&self, record: &CharacterRecord) -> u32 {
        let mut age = self.today.year - record.birth_year;
        if (self.today.month, self.today.day) < (record.birth_month, record.birth_day) {
            age -= 1;
        }
        age.max(0) as u32
    }

    fn view(&self, record: &CharacterRecord) -> Character {
        Character {
            id:           record.id,
            name:         record.name.clone(),
            age:          self.age_of(record),
            gender:       record.gender,
            social_class: record.social_class,
            wealth:       record.wealth,
            influence:    record.influence,
            traits:       record.traits.clone(),
            alive:        record.alive,
            birth_month:  record.birth_month,
            birth_day:    record.birth_day,
        }
    }
}

impl CharacterRepository for InMemoryCharacterRepository {
    fn get(&self, id: CharacterId) -> Option<Character> {
        self.records.get(&id).map(|r| self.view(r))
    }

    fn all_living(&self) -> Vec<Character> {
        self.records
            .values()
            .filter(|r| r.alive)
            .map(|r| self.view(r))
            .collect()
    }

    fn sync_date(&mut self, today: CalendarDate) {
        self.set_date(today);
    }
}
