//! Candidate evaluation — who declares for which office.
//!
//! Each eligible option is scored from independent weighted factors, weak
//! options are filtered out, the field is narrowed to the most prestigious
//! rank still viable, and one office is picked by weighted draw.

use crate::{
    character::Character,
    eligibility::OfficeEligibilityService,
    event::OfficeElectionInfo,
    office::{OfficeCatalog, OfficeDefinition},
    rng::RandomSource,
    types::{CharacterId, OfficeId, Year},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const INFLUENCE_WEIGHT:             f64 = 2.2;
pub const WEALTH_WEIGHT:                f64 = 0.6;
pub const AMBITIOUS_BONUS:              f64 = 12.0;
pub const TRADITIONAL_CENTURIATE_BONUS: f64 = 4.0;
pub const POPULIST_BONUS:               f64 = 5.0;
pub const MATURITY_OFFSET_YEARS:        f64 = 8.0;
pub const MATURITY_SPAN_YEARS:          f64 = 25.0;
pub const MATURITY_WEIGHT:              f64 = 12.0;
pub const OPPORTUNITY_WEIGHT:           f64 = 8.0;
pub const RANK_PRESSURE_STEP:           f64 = 0.35;
pub const AGE_FACTOR_BASE:              f64 = 0.6;
pub const FORTUNA_MAX:                  f64 = 6.0;
/// Options scoring below this share of the best option are not viable.
pub const VIABILITY_RATIO:              f64 = 0.65;
/// Floor weight of any option in the weighted pick.
pub const MIN_PICK_WEIGHT:              f64 = 0.01;

pub const FACTOR_INFLUENCE:     &str = "Influence";
pub const FACTOR_WEALTH:        &str = "Wealth";
pub const FACTOR_TRAITS:        &str = "Traits";
pub const FACTOR_STATUS:        &str = "Status";
pub const FACTOR_MATURITY:      &str = "Maturity";
pub const FACTOR_OPPORTUNITY:   &str = "Opportunity";
pub const FACTOR_RANK_PRESSURE: &str = "RankPressure";
pub const FACTOR_FORTUNA:       &str = "Fortuna";

/// A character's stated intent to run for one office this season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDeclaration {
    pub character_id:   CharacterId,
    pub character_name: String,
    pub office_id:      OfficeId,
    pub desire_score:   f64,
    /// Contribution of each named factor, kept for auditing.
    pub factors:        BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AmbitionScore {
    pub score:   f64,
    pub factors: BTreeMap<String, f64>,
}

/// `clamp01((age − minAge + 8) / 25)`: how seasoned a character is for an office.
pub fn age_factor(age: u32, min_age: u32) -> f64 {
    ((age as f64 - min_age as f64 + MATURITY_OFFSET_YEARS) / MATURITY_SPAN_YEARS).clamp(0.0, 1.0)
}

pub fn trait_bonus(character: &Character, def: &OfficeDefinition) -> f64 {
    let mut bonus = 0.0;
    if character.has_trait("Ambitious") {
        bonus += AMBITIOUS_BONUS;
    }
    if character.has_trait("Traditional") && def.assembly.is_centuriate() {
        bonus += TRADITIONAL_CENTURIATE_BONUS;
    }
    if character.has_trait("Populist") && !def.assembly.is_centuriate() {
        bonus += POPULIST_BONUS;
    }
    bonus
}

pub struct CandidateEvaluationService<'a> {
    catalog:     &'a OfficeCatalog,
    eligibility: OfficeEligibilityService<'a>,
}

impl<'a> CandidateEvaluationService<'a> {
    pub fn new(catalog: &'a OfficeCatalog, eligibility: OfficeEligibilityService<'a>) -> Self {
        Self { catalog, eligibility }
    }

    /// Score one office for one character. Draws Fortuna from `rng`.
    pub fn score_ambition(
        &self,
        character: &Character,
        def:       &OfficeDefinition,
        info:      &OfficeElectionInfo,
        rng:       &mut dyn RandomSource,
    ) -> AmbitionScore {
        let influence = character.influence * INFLUENCE_WEIGHT;
        let wealth = character.wealth.max(0.0).sqrt() * WEALTH_WEIGHT;
        let traits = trait_bonus(character, def);
        let status = def.assembly.status_affinity(character.social_class);
        let age = age_factor(character.age, def.min_age);
        let maturity = age * MATURITY_WEIGHT;
        let opportunity = (info.seats_available as f64 + 1.0).log10() * OPPORTUNITY_WEIGHT;
        let rank_pressure = 1.0 + def.rank as f64 * RANK_PRESSURE_STEP;
        let fortuna = rng.uniform(0.0, FORTUNA_MAX);

        let base = influence + wealth + traits + status + maturity + opportunity;
        let score = (base * (AGE_FACTOR_BASE + age) + fortuna) * rank_pressure;

        let factors = [
            (FACTOR_INFLUENCE, influence),
            (FACTOR_WEALTH, wealth),
            (FACTOR_TRAITS, traits),
            (FACTOR_STATUS, status),
            (FACTOR_MATURITY, maturity),
            (FACTOR_OPPORTUNITY, opportunity),
            (FACTOR_RANK_PRESSURE, rank_pressure),
            (FACTOR_FORTUNA, fortuna),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        AmbitionScore { score, factors }
    }

    /// Decide whether `character` runs this season, and for what.
    ///
    /// Options are evaluated in `election_infos` order, which fixes the
    /// order of RNG draws.
    pub fn try_create_declaration(
        &self,
        character:      &Character,
        election_infos: &[OfficeElectionInfo],
        year:           Year,
        rng:            &mut dyn RandomSource,
    ) -> Option<CandidateDeclaration> {
        let mut options: Vec<(&OfficeDefinition, AmbitionScore)> = Vec::new();
        for info in election_infos {
            let Some(def) = self.catalog.get(&info.office_id) else {
                log::warn!("election info names unknown office '{}'", info.office_id);
                continue;
            };
            if !self.eligibility.is_eligible(character, def, year).is_eligible() {
                continue;
            }
            let ambition = self.score_ambition(character, def, info, rng);
            if ambition.score > 0.0 {
                options.push((def, ambition));
            }
        }
        if options.is_empty() {
            return None;
        }

        let max_score = options
            .iter()
            .map(|(_, a)| a.score)
            .fold(f64::NEG_INFINITY, f64::max);
        let mut viable: Vec<&(&OfficeDefinition, AmbitionScore)> = options
            .iter()
            .filter(|(_, a)| a.score >= VIABILITY_RATIO * max_score)
            .collect();
        if viable.is_empty() {
            viable = options.iter().collect();
        }

        // Rank narrowing hides lower offices once a higher one is viable.
        let top_rank = viable.iter().map(|(d, _)| d.rank).max().unwrap_or(0);
        let mut narrowed: Vec<&(&OfficeDefinition, AmbitionScore)> = viable
            .iter()
            .copied()
            .filter(|(d, _)| d.rank == top_rank)
            .collect();
        if narrowed.is_empty() {
            narrowed = viable;
        }

        let (def, ambition) = *weighted_pick(&narrowed, |(_, a)| a.score, rng)?;
        log::debug!(
            "character {} declares for '{}' (score {:.2}, {} option(s))",
            character.id,
            def.id,
            ambition.score,
            narrowed.len()
        );
        Some(CandidateDeclaration {
            character_id:   character.id,
            character_name: character.name.clone(),
            office_id:      def.id.clone(),
            desire_score:   ambition.score,
            factors:        ambition.factors.clone(),
        })
    }
}

/// Pick one item with probability proportional to `weight`, floored at
/// [`MIN_PICK_WEIGHT`]. Draws exactly one roll from `rng`.
///
/// The first item whose cumulative weight reaches the roll wins; the last
/// item absorbs floating-point shortfall.
pub fn weighted_pick<'t, T>(
    items:  &'t [T],
    weight: impl Fn(&T) -> f64,
    rng:    &mut dyn RandomSource,
) -> Option<&'t T> {
    let last = items.last()?;
    let weights: Vec<f64> = items.iter().map(|i| weight(i).max(MIN_PICK_WEIGHT)).collect();
    let total: f64 = weights.iter().sum();
    let roll = rng.uniform(0.0, total);

    let mut cumulative = 0.0;
    for (item, w) in items.iter().zip(&weights) {
        cumulative += w;
        if roll <= cumulative {
            return Some(item);
        }
    }
    Some(last)
}
