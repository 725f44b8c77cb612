//! Pure candidate-donor matching rules.
//!
//! The persistence adapter pushes the same predicate into SQL for listing
//! endpoints; this module is the definitive semantics and is what the
//! in-memory repository and the tests run against.

use chrono::{DateTime, Utc};

use super::{BloodRequest, User};

/// Optional location constraint applied to candidates.
///
/// When supplied, a donor matches if their city equals the request
/// hospital's city or their state equals the hospital's state
/// (case-insensitive).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocationFilter {
    /// Restrict candidates to the hospital's city or state.
    pub near_hospital: bool,
}

fn eq_ignore_case(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

/// Whether `donor` is a valid candidate for `request` at `now`.
///
/// A candidate must have a blood type compatible with the patient, and must
/// be eligible under the cooldown rule. The stored eligibility flag is
/// deliberately ignored here: the time-based rule is the authority, which
/// also repairs donors whose stored flag went stale.
pub fn is_candidate(
    request: &BloodRequest,
    donor: &User,
    now: DateTime<Utc>,
    filter: LocationFilter,
) -> bool {
    let Some(blood_type) = donor.blood_type else {
        return false;
    };
    if !request.patient.blood_type.accepts(blood_type) {
        return false;
    }
    if !donor.eligible_at(now) {
        return false;
    }
    if filter.near_hospital {
        let city_match = eq_ignore_case(
            donor.location.city.as_deref(),
            request.hospital.city.as_deref(),
        );
        let state_match = eq_ignore_case(
            donor.location.state.as_deref(),
            request.hospital.state.as_deref(),
        );
        if !city_match && !state_match {
            return false;
        }
    }
    true
}

/// Filter and order candidate donors for a request.
///
/// Ordering is deterministic: fewest donations first (spreading load across
/// donors), ties broken by registration time then id. Requesters never donate
/// to their own request.
pub fn candidate_donors(
    request: &BloodRequest,
    donors: impl IntoIterator<Item = User>,
    now: DateTime<Utc>,
    filter: LocationFilter,
) -> Vec<User> {
    let mut candidates: Vec<User> = donors
        .into_iter()
        .filter(|donor| donor.id != request.requester)
        .filter(|donor| is_candidate(request, donor, now, filter))
        .collect();
    candidates.sort_by(|a, b| {
        a.donation_count
            .cmp(&b.donation_count)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
    });
    candidates
}
