//! Exact display-name matching over search hits.
//!
//! # Design Decisions
//! - Matching is exact and case-sensitive; VRChat's search is not
//! - Candidates are scanned in upstream order and the first match wins
//! - No normalization (no trimming, no Unicode folding)

use crate::upstream::CandidateUser;

/// First candidate whose display name equals `display_name` exactly.
pub fn find_exact_match<'a>(
    candidates: &'a [CandidateUser],
    display_name: &str,
) -> Option<&'a CandidateUser> {
    candidates.iter().find(|c| c.display_name == display_name)
}
