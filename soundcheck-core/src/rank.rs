//! Heuristic photo ranking.
//!
//! Scoring is pure arithmetic over the candidate metadata the places
//! provider already returned, so ranking never costs a network call and
//! the same listing always produces the same order.

use crate::places::PhotoCandidate;

/// Flat bonus for landscape orientation. Dwarfs any realistic pixel area so
/// orientation always wins before size is considered.
pub const LANDSCAPE_BONUS: i64 = 100_000_000;

/// Per-pixel-of-width weight, a mild wide-image preference that breaks ties
/// between photos of similar area.
pub const WIDTH_WEIGHT: i64 = 10;

fn score(candidate: &PhotoCandidate, index: usize) -> i64 {
    let width = i64::from(candidate.width.unwrap_or(0));
    let height = i64::from(candidate.height.unwrap_or(0));
    let both_known = width > 0 && height > 0;

    // Unknown dimensions get the benefit of the doubt on orientation but
    // score zero area, so fully-described candidates still outrank them.
    let landscape = !both_known || width >= height;

    // Dimensions are provider-controlled; two u32::MAX sides overflow a
    // plain i64 multiply, so the whole score saturates.
    let area = if both_known {
        width.saturating_mul(height)
    } else {
        0
    };

    let bonus = if landscape { LANDSCAPE_BONUS } else { 0 };
    bonus
        .saturating_add(area)
        .saturating_add(width * WIDTH_WEIGHT)
        .saturating_sub(index as i64)
}

/// Order candidates best-first and keep at most `limit`.
///
/// Prefers landscape over portrait, then larger area, then wider images.
/// The provider's own listing position is a last-resort tiebreaker, so two
/// identical candidates keep their original relative order. Candidates with
/// an empty photo reference are unusable downstream and are dropped here.
pub fn rank_candidates(candidates: Vec<PhotoCandidate>, limit: usize) -> Vec<PhotoCandidate> {
    let mut scored: Vec<(i64, PhotoCandidate)> = candidates
        .into_iter()
        .filter(|c| !c.reference.is_empty())
        .enumerate()
        .map(|(index, candidate)| (score(&candidate, index), candidate))
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.truncate(limit);
    scored.into_iter().map(|(_, candidate)| candidate).collect()
}
