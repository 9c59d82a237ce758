//! Lower bound estimation for scan cover makespans.

/// Largest first contact time among serviceable edges.
///
/// Every edge is serviced no earlier than its first contact, so no scan cover
/// can finish before this. Returns 0 when there are no serviceable edges.
pub fn max_first_contact(first_contacts: &[(usize, f64)]) -> f64 {
    first_contacts
        .iter()
        .map(|&(_, t)| t)
        .fold(0.0, f64::max)
}
