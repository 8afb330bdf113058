use approvals_model::Activity;

/// True iff some actor record on `activity` belongs to `actor_hanford_id`.
///
/// Ghosted activities carry no actors, so nobody is valid on them.
pub fn is_valid_actor(actor_hanford_id: &str, activity: &Activity) -> bool {
    activity.has_actor(actor_hanford_id)
}
