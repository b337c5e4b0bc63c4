use crate::{
    character::CharacterRecord,
    clock::{DAYS_PER_MONTH, MONTHS_PER_YEAR},
    error::{SimError, SimResult},
    office::{Assembly, OfficeCatalog, OfficeDefinition},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// When in the year the election season runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSeasonConfig {
    pub open_month:  u8,
    pub open_day:    u8,
    pub close_month: u8,
    pub close_day:   u8,
    /// Magistrates elected in year Y take office in Y+1.
    #[serde(default = "default_true")]
    pub terms_begin_following_year: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ElectionSeasonConfig {
    fn default() -> Self {
        Self {
            open_month:  6,
            open_day:    1,
            close_month: 7,
            close_day:   1,
            terms_begin_following_year: true,
        }
    }
}

impl ElectionSeasonConfig {
    pub fn opens_on(&self, month: u8, day: u8) -> bool {
        (month, day) == (self.open_month, self.open_day)
    }

    pub fn closes_on(&self, month: u8, day: u8) -> bool {
        (month, day) == (self.close_month, self.close_day)
    }

    pub fn validate(&self) -> SimResult<()> {
        let valid = |m: u8, d: u8| (1..=MONTHS_PER_YEAR).contains(&m) && (1..=DAYS_PER_MONTH).contains(&d);
        if !valid(self.open_month, self.open_day) || !valid(self.close_month, self.close_day) {
            return Err(SimError::validation(format!(
                "season dates {}/{}..{}/{} fall outside the calendar",
                self.open_month, self.open_day, self.close_month, self.close_day
            )));
        }
        if (self.close_month, self.close_day) <= (self.open_month, self.open_day) {
            return Err(SimError::validation("election season must close after it opens"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoliticsConfig {
    #[serde(default = "default_seed")]
    pub master_seed: u64,
    #[serde(default)]
    pub season:      ElectionSeasonConfig,
    pub offices:     Vec<OfficeDefinition>,
}

fn default_seed() -> u64 {
    42
}

#[derive(Debug, Clone, Deserialize)]
struct RosterFile {
    characters: Vec<CharacterRecord>,
}

impl PoliticsConfig {
    /// Load from `{data_dir}/politics.json`.
    /// In tests, use PoliticsConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/politics.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: PoliticsConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.season.validate()?;
        // Catalog validation is fatal at load, not at first use.
        config.catalog()?;
        Ok(config)
    }

    /// Build the validated office catalog.
    pub fn catalog(&self) -> SimResult<OfficeCatalog> {
        OfficeCatalog::new(self.offices.clone())
    }

    /// Config with hardcoded defaults for use in unit tests:
    /// the classic cursus honorum.
    pub fn default_test() -> Self {
        let office = |id: &str,
                      name: &str,
                      assembly: Assembly,
                      min_age: u32,
                      seats: u32,
                      term: u32,
                      gap: u32,
                      rank: u32,
                      prereqs: &[&str]| OfficeDefinition {
            id: id.into(),
            name: name.into(),
            assembly,
            min_age,
            term_length_years: term,
            seats,
            reelection_gap_years: gap,
            rank,
            prerequisites_all: prereqs.iter().map(|p| p.to_string()).collect::<BTreeSet<_>>(),
        };

        Self {
            master_seed: default_seed(),
            season: ElectionSeasonConfig::default(),
            offices: vec![
                office("quaestor", "Quaestor", Assembly::Tribal, 28, 8, 1, 0, 1, &[]),
                office("tribune", "Tribune of the Plebs", Assembly::PlebeianCouncil, 27, 10, 1, 0, 2, &[]),
                office("aedile", "Aedile", Assembly::Tribal, 36, 4, 1, 2, 2, &["quaestor"]),
                office("praetor", "Praetor", Assembly::Centuriate, 39, 4, 1, 2, 4, &["quaestor"]),
                office("consul", "Consul", Assembly::Centuriate, 42, 2, 1, 10, 5, &["praetor"]),
                office("censor", "Censor", Assembly::Centuriate, 45, 2, 5, 10, 6, &["consul"]),
            ],
        }
    }
}

/// Load a character roster (`{"characters": [...]}`).
pub fn load_roster(path: &str) -> anyhow::Result<Vec<CharacterRecord>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    let file: RosterFile = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
    Ok(file.characters)
}
