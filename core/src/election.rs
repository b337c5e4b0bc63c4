//! Vote simulation and result application for one office at a time.

use crate::{
    candidate::CandidateDeclaration,
    character::Character,
    event::{CandidateTally, ElectionResultSummary, ElectionWinner, SimEvent},
    office::{OfficeCatalog, OfficeDefinition},
    office_state::{OfficeStateService, SeatAssignmentDescriptor},
    rng::RandomSource,
    types::{CharacterId, Year},
};
use std::collections::BTreeMap;

/// Weight of raw influence when the assembly votes.
pub const SUPPORT_WEIGHT:     f64 = 1.5;
/// Weight of class/assembly affinity when the assembly votes.
pub const AFFINITY_WEIGHT:    f64 = 0.5;
pub const CAMPAIGN_SWING_MAX: f64 = 5.0;

pub const VOTE_AMBITION: &str = "Ambition";
pub const VOTE_SUPPORT:  &str = "Support";
pub const VOTE_AFFINITY: &str = "Affinity";
pub const VOTE_CAMPAIGN: &str = "Campaign";

/// A declared candidate inside one season's vote. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectionCandidate {
    pub declaration:    CandidateDeclaration,
    pub character:      Character,
    pub vote_breakdown: BTreeMap<String, f64>,
    pub final_score:    f64,
}

impl ElectionCandidate {
    pub fn new(declaration: CandidateDeclaration, character: Character) -> Self {
        Self {
            declaration,
            character,
            vote_breakdown: BTreeMap::new(),
            final_score: 0.0,
        }
    }

    pub fn character_id(&self) -> CharacterId {
        self.declaration.character_id
    }
}

/// A winner as ranked by the vote, before seats are actually assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedWinner {
    /// Index into the candidate slice passed to `select_winners`.
    pub candidate_index: usize,
    pub character_id:    CharacterId,
    /// Rank among the winners. The seat actually taken comes from
    /// `assign_office`, and that is the one the summary and `OfficeAssigned`
    /// report.
    pub seat_index:      u32,
}

#[derive(Debug, Default)]
pub struct ElectionVoteSimulator;

impl ElectionVoteSimulator {
    pub fn new() -> Self {
        Self
    }

    /// Fill in each candidate's vote breakdown and final score.
    ///
    /// The declaration's ambition score carries over unchanged; the assembly
    /// adds support from influence and class affinity, plus a campaign swing
    /// drawn from `rng` in candidate order.
    pub fn score_candidates(
        &self,
        office:     &OfficeDefinition,
        candidates: &mut [ElectionCandidate],
        rng:        &mut dyn RandomSource,
    ) {
        for candidate in candidates.iter_mut() {
            let ambition = candidate.declaration.desire_score;
            let support = candidate.character.influence.max(0.0) * SUPPORT_WEIGHT;
            let affinity =
                office.assembly.status_affinity(candidate.character.social_class) * AFFINITY_WEIGHT;
            let campaign = rng.uniform(0.0, CAMPAIGN_SWING_MAX);

            candidate.vote_breakdown = [
                (VOTE_AMBITION, ambition),
                (VOTE_SUPPORT, support),
                (VOTE_AFFINITY, affinity),
                (VOTE_CAMPAIGN, campaign),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
            candidate.final_score = ambition + support + affinity + campaign;
        }
    }

    /// Top `seats_available` candidates by final score, ties to the lower
    /// character id. Seat indices follow ranking order.
    pub fn select_winners(
        &self,
        candidates:      &[ElectionCandidate],
        seats_available: u32,
    ) -> Vec<SelectedWinner> {
        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.sort_by(|&a, &b| {
            let (ca, cb) = (&candidates[a], &candidates[b]);
            cb.final_score
                .total_cmp(&ca.final_score)
                .then(ca.character_id().cmp(&cb.character_id()))
        });

        order
            .into_iter()
            .take(seats_available as usize)
            .enumerate()
            .map(|(seat, idx)| SelectedWinner {
                candidate_index: idx,
                character_id:    candidates[idx].character_id(),
                seat_index:      seat as u32,
            })
            .collect()
    }
}

/// What applying one office's results produced.
#[derive(Debug, Clone, PartialEq)]
pub struct OfficeResultOutcome {
    pub summary:     ElectionResultSummary,
    /// Seats actually assigned, for the term tracker.
    pub assignments: Vec<SeatAssignmentDescriptor>,
}

#[derive(Debug, Default)]
pub struct ElectionResultService;

impl ElectionResultService {
    pub fn new() -> Self {
        Self
    }

    /// Commit `winners` through OfficeStateService and summarize the vote.
    ///
    /// A winner whose assignment is rejected is left out of the summary; the
    /// rejection has already been logged by the state service.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_office_results(
        &self,
        office:      &OfficeDefinition,
        year:        Year,
        candidates:  &[ElectionCandidate],
        winners:     &[SelectedWinner],
        total_score: f64,
        defer:       bool,
        state:       &mut OfficeStateService,
        catalog:     &OfficeCatalog,
    ) -> OfficeResultOutcome {
        let mut assignments = Vec::with_capacity(winners.len());
        let mut summary_winners = Vec::with_capacity(winners.len());

        for winner in winners {
            let candidate = &candidates[winner.candidate_index];
            match state.assign_office(&office.id, winner.character_id, year, defer, catalog) {
                Ok(descriptor) => {
                    summary_winners.push(ElectionWinner {
                        character_id:   winner.character_id,
                        character_name: candidate.declaration.character_name.clone(),
                        seat_index:     descriptor.seat_index,
                    });
                    assignments.push(descriptor);
                }
                Err(e) => {
                    log::warn!(
                        "year={year} '{}': winner {} not seated: {e}",
                        office.id,
                        winner.character_id
                    );
                }
            }
        }

        let neutral_share = if candidates.is_empty() {
            0.0
        } else {
            1.0 / candidates.len() as f64
        };
        if total_score <= 0.0 && !candidates.is_empty() {
            log::warn!(
                "year={year} '{}': total score {total_score:.3} is not positive; using neutral shares",
                office.id
            );
        }

        let tallies = candidates
            .iter()
            .map(|c| CandidateTally {
                character_id: c.character_id(),
                score:        c.final_score,
                share:        if total_score > 0.0 { c.final_score / total_score } else { neutral_share },
                elected:      summary_winners.iter().any(|w| w.character_id == c.character_id()),
            })
            .collect();

        OfficeResultOutcome {
            summary: ElectionResultSummary {
                office_id:   office.id.clone(),
                office_name: office.name.clone(),
                winners:     summary_winners,
                tallies,
            },
            assignments,
        }
    }

    /// The season-completed event carrying every office's summary.
    pub fn publish_election_results(
        &self,
        year:         Year,
        month:        u8,
        day:          u8,
        seats_filled: usize,
        summaries:    Vec<ElectionResultSummary>,
    ) -> SimEvent {
        log::info!(
            "year={year} elections completed: {seats_filled} seat(s) filled across {} office(s)",
            summaries.len()
        );
        SimEvent::ElectionSeasonCompleted {
            election_year: year,
            month,
            day,
            results: summaries,
        }
    }
}
