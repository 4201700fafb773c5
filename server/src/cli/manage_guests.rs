use crate::cli::CliAuthTokenKey;
use crate::cli_error::CliError;
use crate::data_store::auth_token::AuthToken;
use crate::data_store::models::{CheckIn, Guest, RsvpLogEntry};
use crate::data_store::{get_store_from_env, GuestStore};
use log::info;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// Create or update all guests from the given JSON file.
///
/// The file must contain a list of guest objects, as used by the web API. Existing guests with the
/// same code are overwritten, including their RSVP status. All guests are imported in a single
/// transaction, so nothing is changed if any of them is invalid.
pub fn load_guests_from_file(path: &PathBuf, auth_key: CliAuthTokenKey) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let f = File::open(path).map_err(|error| CliError::GuestFileUnreadable {
        path: path.clone(),
        error,
    })?;
    let data: Vec<rsvp_api_types::Guest> = serde_json::from_reader(BufReader::new(f))?;
    check_for_duplicate_codes(&data)?;
    let count = data.len();

    let auth_token = AuthToken::create_for_cli(&auth_key);
    let created = data_store.import_guests(&auth_token, data.into_iter().map(Guest::from).collect())?;
    info!("Imported guest list from {:?}", path);
    println!(
        "Success. {} guests imported ({} new, {} updated).",
        count,
        created,
        count - created
    );
    Ok(())
}

fn check_for_duplicate_codes(guests: &[rsvp_api_types::Guest]) -> Result<(), CliError> {
    let mut seen = HashSet::new();
    for guest in guests {
        let code = crate::data_store::models::normalize_code(&guest.code);
        if !seen.insert(code.clone()) {
            return Err(CliError::InvalidGuestData(format!(
                "Guest code {} appears more than once",
                code
            )));
        }
    }
    Ok(())
}

pub fn print_guest_list() -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let auth_key = CliAuthTokenKey::new();
    let auth_token = AuthToken::create_for_cli(&auth_key);
    let guests = data_store.get_guests(&auth_token)?;
    let check_ins = data_store.get_check_ins(&auth_token)?;
    let checked_in = checked_in_codes(&check_ins);

    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED)
        .set_header(vec![
            "code",
            "name",
            "seating zone",
            "table",
            "designation",
            "rsvp",
            "checked in",
        ])
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic)
        .add_rows(guests.iter().map(|guest| {
            [
                guest.code.clone(),
                guest.name.clone(),
                guest.seating_zone.clone(),
                guest.table_assigned.clone(),
                guest.designation.clone(),
                guest.rsvp_status.to_string(),
                if checked_in.contains(guest.code.as_str()) {
                    "yes".to_owned()
                } else {
                    "".to_owned()
                },
            ]
        }));

    println!("{} guests:", guests.len());
    println!("{table}");
    Ok(())
}

/// Print the chronological log of all RSVP answers
pub fn print_rsvp_log() -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let auth_key = CliAuthTokenKey::new();
    let auth_token = AuthToken::create_for_cli(&auth_key);
    let log_entries = data_store.get_rsvp_log(&auth_token)?;

    println!("{}", rsvp_log_table(log_entries));
    Ok(())
}

fn rsvp_log_table(log_entries: Vec<RsvpLogEntry>) -> comfy_table::Table {
    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED)
        .set_header(vec!["#", "time", "code", "name", "attendance"])
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic)
        .add_rows(log_entries.into_iter().map(|entry| {
            [
                entry.id.to_string(),
                entry.logged_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                entry.code,
                entry.name,
                entry.attendance.to_string(),
            ]
        }));
    table
}

fn checked_in_codes(check_ins: &[CheckIn]) -> HashSet<&str> {
    check_ins.iter().map(|c| c.guest_code.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_guest(code: &str) -> rsvp_api_types::Guest {
        rsvp_api_types::Guest {
            code: code.to_string(),
            name: "Someone".to_string(),
            seating_zone: "".to_string(),
            table_assigned: "".to_string(),
            designation: "".to_string(),
            rsvp_status: rsvp_api_types::RsvpStatus::Unset,
        }
    }

    #[test]
    fn test_duplicate_codes_are_rejected() {
        assert!(check_for_duplicate_codes(&[api_guest("AB1"), api_guest("AB2")]).is_ok());
        assert!(matches!(
            check_for_duplicate_codes(&[api_guest("AB1"), api_guest(" ab1")]),
            Err(CliError::InvalidGuestData(_))
        ));
    }

    #[test]
    fn test_guest_file_format() {
        let data: Vec<rsvp_api_types::Guest> = serde_json::from_str(
            r#"[
                {"code": "jo001", "name": "Kwame Boateng", "seating_zone": "VIP", "table_assigned": "3"},
                {"code": "JO002", "name": "Abena Owusu", "rsvp_status": "yes"}
            ]"#,
        )
        .unwrap();
        let guests: Vec<Guest> = data.into_iter().map(Guest::from).collect();
        assert_eq!(guests[0].designation, "");
        assert_eq!(guests[1].rsvp_status, crate::data_store::models::RsvpStatus::Yes);
        assert_eq!(guests[0].clone().validated().unwrap().code, "JO001");
    }

    #[test]
    fn test_rsvp_log_table() {
        let table = rsvp_log_table(vec![RsvpLogEntry {
            id: 42,
            logged_at: chrono::DateTime::from_timestamp(1_746_100_800, 0).unwrap(),
            code: "JO002".to_string(),
            name: "Abena Owusu".to_string(),
            attendance: crate::data_store::models::RsvpStatus::Yes,
        }])
        .to_string();
        assert!(table.contains("42"));
        assert!(table.contains("2025-05-01T12:00:00Z"));
        assert!(table.contains("Abena Owusu"));
    }
}
