//! Form encoding for status updates.
//!
//! The submit endpoint takes the whole row, not a single cell: every
//! resident column must be echoed back or the server resets the omitted
//! ones. The encoder therefore works from a full [`StatusRow`] snapshot and
//! replaces exactly one column.

use crate::error::{Error, Result};
use crate::parse::{DinnerStatus, StatusRow};

/// Marker the form uses for a status submission.
pub(crate) const SUBMITTYPE_STATUS: &str = "0";

/// The site's submit buttons are images; the form reports the click
/// coordinates and dispatches on their presence.
const SUBMIT_BUTTON_COORD: &str = "20";

/// The site's numeric scheme for a status cell: negative counts eat along,
/// positive counts cook, zero declines and -5 means no response. A guest
/// count too large for the scheme is refused rather than clamped.
pub fn wire_value(status: DinnerStatus) -> Result<i32> {
    let value = match status {
        DinnerStatus::Unknown => -5,
        DinnerStatus::No => 0,
        DinnerStatus::Dinner { guests } => -head_count(guests)?,
        DinnerStatus::Cook { guests } => head_count(guests)?,
    };
    Ok(value)
}

fn head_count(guests: u32) -> Result<i32> {
    i32::try_from(u64::from(guests) + 1)
        .map_err(|_| Error::submit("guest count too large to encode"))
}

/// Inverse of [`wire_value`]. Values outside the scheme are a scrape error.
pub fn status_from_wire(value: i32) -> Result<DinnerStatus> {
    match value {
        -5 => Ok(DinnerStatus::Unknown),
        0 => Ok(DinnerStatus::No),
        v if v < 0 => Ok(DinnerStatus::Dinner {
            guests: u32::try_from(-v - 1).map_err(|_| Error::scrape("invalid status value"))?,
        }),
        v => Ok(DinnerStatus::Cook {
            guests: u32::try_from(v - 1).map_err(|_| Error::scrape("invalid status value"))?,
        }),
    }
}

/// Encode a single-resident change against a full row snapshot. Produces one
/// `status[i]` field per resident in column order, with all non-target
/// columns echoing their current value, plus the row key and submit marker.
pub fn encode_status_update(
    row: &StatusRow,
    resident_ordinal: usize,
    new_status: DinnerStatus,
) -> Result<Vec<(String, String)>> {
    if resident_ordinal >= row.statuses().len() {
        return Err(Error::submit("resident ordinal outside the status grid"));
    }

    let mut fields = vec![
        ("day[]".to_string(), row.timestamp().timestamp().to_string()),
        ("submittype".to_string(), SUBMITTYPE_STATUS.to_string()),
        ("submitwithform.x".to_string(), SUBMIT_BUTTON_COORD.to_string()),
        ("submitwithform.y".to_string(), SUBMIT_BUTTON_COORD.to_string()),
    ];

    for (ordinal, cell) in row.statuses().iter().enumerate() {
        let status = if ordinal == resident_ordinal {
            new_status
        } else {
            cell.status()
        };
        fields.push((format!("status[{ordinal}]"), wire_value(status)?.to_string()));
    }

    Ok(fields)
}

/// Field set for replacing the noticeboard wholesale. The form only applies
/// the new text when the edit button's click coordinates come along.
pub fn encode_noticeboard_update(message: &str) -> Vec<(String, String)> {
    vec![
        ("Aanpassen.x".to_string(), SUBMIT_BUTTON_COORD.to_string()),
        ("Aanpassen.y".to_string(), SUBMIT_BUTTON_COORD.to_string()),
        ("messageboard".to_string(), message.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{StatusCell, TZ_EETLIJST};
    use chrono::{TimeZone, Utc};

    fn snapshot() -> StatusRow {
        let timestamp = Utc.timestamp_opt(1_396_188_000, 0).single().unwrap();
        let statuses = [
            DinnerStatus::Cook { guests: 0 },
            DinnerStatus::Dinner { guests: 2 },
            DinnerStatus::No,
            DinnerStatus::No,
            DinnerStatus::Unknown,
        ];
        StatusRow::new(
            timestamp,
            Some(timestamp.with_timezone(&TZ_EETLIJST)),
            statuses
                .iter()
                .map(|&status| StatusCell::new(status, None))
                .collect(),
        )
    }

    #[test]
    fn wire_scheme_round_trips() {
        for status in [
            DinnerStatus::Unknown,
            DinnerStatus::No,
            DinnerStatus::Dinner { guests: 0 },
            DinnerStatus::Dinner { guests: 3 },
            DinnerStatus::Cook { guests: 1 },
        ] {
            assert_eq!(status_from_wire(wire_value(status).unwrap()).unwrap(), status);
        }
    }

    #[test]
    fn update_touches_only_the_target_column() {
        let row = snapshot();
        let fields =
            encode_status_update(&row, 4, DinnerStatus::Dinner { guests: 1 }).unwrap();

        assert_eq!(fields[0], ("day[]".to_string(), "1396188000".to_string()));
        assert_eq!(fields[1], ("submittype".to_string(), "0".to_string()));
        assert_eq!(fields[2], ("submitwithform.x".to_string(), "20".to_string()));
        assert_eq!(fields[3], ("submitwithform.y".to_string(), "20".to_string()));

        // Re-decode every column and compare against the snapshot.
        for (ordinal, cell) in row.statuses().iter().enumerate() {
            let (name, value) = &fields[4 + ordinal];
            assert_eq!(name, &format!("status[{ordinal}]"));

            let decoded = status_from_wire(value.parse().unwrap()).unwrap();
            if ordinal == 4 {
                assert_eq!(decoded, DinnerStatus::Dinner { guests: 1 });
            } else {
                assert_eq!(decoded, cell.status());
            }
        }
    }

    #[test]
    fn ordinal_out_of_range_is_rejected() {
        let row = snapshot();
        let result = encode_status_update(&row, 5, DinnerStatus::No);
        assert!(matches!(result, Err(Error::Submit(_))));
    }

    #[test]
    fn oversized_guest_count_is_rejected() {
        let result = wire_value(DinnerStatus::Dinner { guests: u32::MAX });
        assert!(matches!(result, Err(Error::Submit(_))));
    }

    #[test]
    fn noticeboard_update_carries_button_coordinates() {
        let fields = encode_noticeboard_update("Huur overmaken!");

        assert_eq!(fields[0], ("Aanpassen.x".to_string(), "20".to_string()));
        assert_eq!(fields[1], ("Aanpassen.y".to_string(), "20".to_string()));
        assert_eq!(
            fields[2],
            ("messageboard".to_string(), "Huur overmaken!".to_string())
        );
    }
}
