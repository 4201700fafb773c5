use crate::cli::util::{query_user, query_user_and_check, query_user_bool};
use crate::cli::CliAuthTokenKey;
use crate::cli_error::CliError;
use crate::data_store::auth_token::AuthToken;
use crate::data_store::models::NewAdmin;
use crate::data_store::password::hash_password;
use crate::data_store::{get_store_from_env, GuestStore};

const MIN_PASSWORD_LENGTH: usize = 8;

pub fn print_admin_list() -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let auth_key = CliAuthTokenKey::new();
    let auth_token = AuthToken::create_for_cli(&auth_key);
    let admins = data_store.get_admins(&auth_token)?;

    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED)
        .set_header(vec!["id", "username", "name"])
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic)
        .add_rows(
            admins
                .into_iter()
                .map(|admin| [admin.id.to_string(), admin.username, admin.name]),
        );

    println!("{table}");
    Ok(())
}

pub fn add_admin() -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let username: String = query_user_and_check("Enter username", validate_username);
    let name: String = query_user("Enter display name");
    let password: String = query_user_and_check("Enter password", validate_password);

    if !query_user_bool(&format!("Create admin account '{}'?", username), Some(true)) {
        return Ok(());
    }
    let password_hash = hash_password(&password)?;

    let auth_key = CliAuthTokenKey::new();
    let auth_token = AuthToken::create_for_cli(&auth_key);
    let admin_id = data_store.create_admin(
        &auth_token,
        NewAdmin {
            username,
            password_hash,
            name,
        },
    )?;
    println!("Success. New admin id: {}", admin_id);
    Ok(())
}

#[allow(clippy::ptr_arg)] // signature required by query_user_and_check
fn validate_username(username: &String) -> Result<(), &'static str> {
    if username.is_empty() {
        return Err("Username must not be empty");
    }
    if username.chars().any(|c| c.is_whitespace()) {
        return Err("Username must not contain whitespace");
    }
    Ok(())
}

#[allow(clippy::ptr_arg)]
fn validate_password(password: &String) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username(&"anna".to_string()).is_ok());
        assert!(validate_username(&"".to_string()).is_err());
        assert!(validate_username(&"anna maria".to_string()).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password(&"correct horse".to_string()).is_ok());
        assert!(validate_password(&"short".to_string()).is_err());
    }
}
