// Last-write-wins reconciliation of local vs. remote pick records.

use crate::picks::record::PickRecord;

/// Reconcile two candidate copies of the same record into one authoritative
/// copy. The result is always one of the inputs verbatim — merging never
/// fabricates or combines data.
///
/// The remote copy wins only when both timestamps parse and the remote one
/// is strictly newer. Ties, missing timestamps, and unparseable timestamps
/// all resolve to the local copy, keeping the outcome deterministic.
pub fn merge_records(
    local: Option<PickRecord>,
    remote: Option<PickRecord>,
) -> Option<PickRecord> {
    match (local, remote) {
        (None, None) => None,
        (Some(l), None) => Some(l),
        (None, Some(r)) => Some(r),
        (Some(l), Some(r)) => match (l.saved_at_time(), r.saved_at_time()) {
            (Some(lt), Some(rt)) if rt > lt => Some(r),
            _ => Some(l),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picks::record::{Pick, PickSet};

    fn record(team: &str, saved_at: Option<&str>) -> PickRecord {
        let mut picks = PickSet::new();
        picks.insert("G1".into(), Pick::new(team, 1));
        PickRecord {
            picks,
            saved_at: saved_at.map(String::from),
        }
    }

    fn picked_team(record: &PickRecord) -> &str {
        &record.picks["G1"].team
    }

    #[test]
    fn both_absent_yields_absent() {
        assert_eq!(merge_records(None, None), None);
    }

    #[test]
    fn single_present_side_wins() {
        let local = record("Local", Some("2025-09-07T12:00:00Z"));
        let remote = record("Remote", Some("2025-09-07T12:00:00Z"));

        let out = merge_records(Some(local.clone()), None).unwrap();
        assert_eq!(picked_team(&out), "Local");

        let out = merge_records(None, Some(remote)).unwrap();
        assert_eq!(picked_team(&out), "Remote");
    }

    #[test]
    fn newer_remote_wins() {
        let local = record("Local", Some("2025-09-07T12:00:00Z"));
        let remote = record("Remote", Some("2025-09-07T12:00:01Z"));
        let out = merge_records(Some(local), Some(remote)).unwrap();
        assert_eq!(picked_team(&out), "Remote");
    }

    #[test]
    fn newer_local_wins() {
        let local = record("Local", Some("2025-09-08T00:00:00Z"));
        let remote = record("Remote", Some("2025-09-07T12:00:00Z"));
        let out = merge_records(Some(local), Some(remote)).unwrap();
        assert_eq!(picked_team(&out), "Local");
    }

    #[test]
    fn exact_tie_prefers_local() {
        let local = record("Local", Some("2025-09-07T12:00:00Z"));
        let remote = record("Remote", Some("2025-09-07T12:00:00Z"));
        let out = merge_records(Some(local), Some(remote)).unwrap();
        assert_eq!(picked_team(&out), "Local");
    }

    #[test]
    fn missing_timestamps_prefer_local() {
        let out = merge_records(Some(record("Local", None)), Some(record("Remote", None)));
        assert_eq!(picked_team(&out.unwrap()), "Local");

        let out = merge_records(
            Some(record("Local", None)),
            Some(record("Remote", Some("2025-09-07T12:00:00Z"))),
        );
        assert_eq!(picked_team(&out.unwrap()), "Local");

        let out = merge_records(
            Some(record("Local", Some("2025-09-07T12:00:00Z"))),
            Some(record("Remote", None)),
        );
        assert_eq!(picked_team(&out.unwrap()), "Local");
    }

    #[test]
    fn unparseable_timestamp_treated_as_missing() {
        let out = merge_records(
            Some(record("Local", Some("not a date"))),
            Some(record("Remote", Some("2099-01-01T00:00:00Z"))),
        );
        assert_eq!(picked_team(&out.unwrap()), "Local");
    }

    #[test]
    fn merge_is_idempotent() {
        let local = record("Local", Some("2025-09-07T12:00:00Z"));
        let remote = record("Remote", Some("2025-09-08T12:00:00Z"));

        let once = merge_records(Some(local.clone()), Some(remote.clone()));
        let twice = merge_records(once.clone(), once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn timezone_offsets_compare_by_instant() {
        // 07:00-05:00 is the same instant as 12:00Z; +1s in the offset zone wins.
        let local = record("Local", Some("2025-09-07T12:00:00Z"));
        let remote = record("Remote", Some("2025-09-07T07:00:01-05:00"));
        let out = merge_records(Some(local), Some(remote)).unwrap();
        assert_eq!(picked_team(&out), "Remote");
    }
}
