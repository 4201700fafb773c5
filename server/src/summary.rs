use crate::data_store::models::{normalize_code, CheckIn, Guest, RsvpStatus};
use rsvp_api_types::{Summary, ZoneSummary};
use std::collections::{BTreeMap, HashSet};

/// Compute the RSVP and check-in statistics of the event.
///
/// A guest counts as checked in if at least one check-in row references its code. Check-in rows of
/// guests that are no longer in the guest list are ignored.
pub fn compute_summary<'a>(
    guests: impl IntoIterator<Item = &'a Guest>,
    check_ins: &[CheckIn],
) -> Summary {
    let checked_in_codes: HashSet<String> = check_ins
        .iter()
        .map(|c| normalize_code(&c.guest_code))
        .collect();

    let mut summary = Summary::default();
    let mut zones: BTreeMap<&str, ZoneSummary> = BTreeMap::new();
    for guest in guests {
        let zone = zones
            .entry(guest.seating_zone.trim())
            .or_insert_with(|| ZoneSummary {
                seating_zone: guest.seating_zone.trim().to_owned(),
                ..ZoneSummary::default()
            });
        summary.total_guests += 1;
        zone.total += 1;
        match guest.rsvp_status {
            RsvpStatus::Yes => {
                summary.attending += 1;
                zone.attending += 1;
            }
            RsvpStatus::No => summary.declined += 1,
            RsvpStatus::Unset => summary.pending += 1,
        }
        if checked_in_codes.contains(&normalize_code(&guest.code)) {
            summary.checked_in += 1;
            zone.checked_in += 1;
        }
    }
    summary.zones = zones.into_values().collect();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guest(code: &str, zone: &str, rsvp_status: RsvpStatus) -> Guest {
        Guest {
            code: code.to_string(),
            name: format!("Guest {}", code),
            seating_zone: zone.to_string(),
            table_assigned: "".to_string(),
            designation: "".to_string(),
            rsvp_status,
        }
    }

    fn check_in(code: &str) -> CheckIn {
        CheckIn {
            id: 0,
            checked_in_at: chrono::Utc::now(),
            guest_code: code.to_string(),
            guest_name: "".to_string(),
            table_assigned: "".to_string(),
            designation: "".to_string(),
            attendant: "door".to_string(),
        }
    }

    #[test]
    fn test_compute_summary() {
        let guests = vec![
            guest("A1", "VIP", RsvpStatus::Yes),
            guest("A2", "VIP", RsvpStatus::No),
            guest("B1", "Garden", RsvpStatus::Yes),
            guest("B2", "Garden", RsvpStatus::Unset),
            guest("C1", "", RsvpStatus::Unset),
        ];
        let check_ins = vec![check_in("A1"), check_in("b2"), check_in("ZZ9"), check_in("A1")];

        let summary = compute_summary(&guests, &check_ins);
        assert_eq!(summary.total_guests, 5);
        assert_eq!(summary.attending, 2);
        assert_eq!(summary.declined, 1);
        assert_eq!(summary.pending, 2);
        assert_eq!(summary.checked_in, 2);
        assert_eq!(
            summary.zones,
            vec![
                ZoneSummary {
                    seating_zone: "".to_string(),
                    total: 1,
                    attending: 0,
                    checked_in: 0
                },
                ZoneSummary {
                    seating_zone: "Garden".to_string(),
                    total: 2,
                    attending: 1,
                    checked_in: 1
                },
                ZoneSummary {
                    seating_zone: "VIP".to_string(),
                    total: 2,
                    attending: 1,
                    checked_in: 1
                },
            ]
        );
    }

    #[test]
    fn test_compute_summary_empty() {
        assert_eq!(compute_summary(&[], &[]), Summary::default());
    }
}
