//! Session sequencing: an ordered run of rounds across escalating tiers.
use rand::Rng;

use crate::calibrate::DifficultyTier;
use crate::config::QuizConfig;
use crate::data::Company;
use crate::sampler::{Round, RoundSampler};

/// Build the ordered rounds for one session.
///
/// Slot `i` targets [`DifficultyTier::for_round`]. Slots the pool cannot fill
/// are skipped, so the result may hold fewer than `round_count` rounds; the
/// surviving rounds keep the 1-based number of the slot they were built for.
pub fn build_rounds<R: Rng + ?Sized>(
    companies: &[Company],
    config: &QuizConfig,
    rng: &mut R,
) -> Vec<Round> {
    let sampler = RoundSampler::new(companies, config.sampling_limits());
    let mut rounds = Vec::with_capacity(usize::from(config.round_count));
    for (index, number) in (1..=config.round_count).enumerate() {
        let tier = DifficultyTier::for_round(index);
        let band = config.bands.band(tier);
        match sampler.sample(tier, band, config.fallback, rng) {
            Some(mut round) => {
                round.number = number;
                rounds.push(round);
            }
            None => {
                log::warn!(
                    "round {number} ({tier}) omitted: no usable pairing in {} companies",
                    companies.len()
                );
            }
        }
    }
    rounds
}
