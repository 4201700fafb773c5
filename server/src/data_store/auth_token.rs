use crate::cli::CliAuthTokenKey;
use crate::data_store::{AdminId, StoreError};

/// Authorization token for accessing the data_store
///
/// The AuthToken holds the list of active [AccessRole]s in the current context. These imply
/// specific [Privilege]s. All data_store access functions require an AuthToken and check it for
/// the required privilege.
///
/// An AuthToken with the [AccessRole::Admin] role can only be created by
/// [crate::data_store::GuestStoreFacade::get_auth_token_for_session], after validating the admin
/// account referenced by the client's session, and by cli functions via [Self::create_for_cli].
/// Anonymous clients (guests and door staff) use [Self::public].
#[derive(Debug)]
pub struct AuthToken {
    roles: Vec<AccessRole>,
    admin_id: Option<AdminId>,
}

impl AuthToken {
    /// Create an AuthToken for unauthenticated web clients.
    pub fn public() -> Self {
        AuthToken {
            roles: vec![AccessRole::Public],
            admin_id: None,
        }
    }

    /// Create a new AuthToken for an authenticated admin session.
    ///
    /// This function must only be used by implementations of
    /// [crate::data_store::GuestStoreFacade::get_auth_token_for_session] after checking that the
    /// admin account exists!
    pub(super) fn create_for_admin_session(admin_id: AdminId) -> Self {
        AuthToken {
            roles: vec![AccessRole::Public, AccessRole::Admin],
            admin_id: Some(admin_id),
        }
    }

    /// Create a new AuthToken for a command line interface functionality.
    ///
    /// This function must only be used by command line interface functions, not in the context of
    /// the web server!
    pub fn create_for_cli(_key: &CliAuthTokenKey) -> Self {
        AuthToken {
            roles: vec![AccessRole::Public, AccessRole::Admin],
            admin_id: None,
        }
    }

    /// The admin account this token has been created for, if it belongs to an admin session.
    pub fn admin_id(&self) -> Option<AdminId> {
        self.admin_id
    }

    pub fn has_privilege(&self, privilege: Privilege) -> bool {
        privilege
            .qualifying_roles()
            .iter()
            .any(|role| self.roles.contains(role))
    }

    /// Check if the AuthToken authorizes for the given `privilege`. If not, return an appropriate
    /// PermissionDenied error.
    pub fn check_privilege(&self, privilege: Privilege) -> Result<(), StoreError> {
        if self.has_privilege(privilege) {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied {
                required_privilege: privilege,
            })
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum AccessRole {
    Public,
    Admin,
}

impl AccessRole {
    pub fn name(&self) -> &str {
        match self {
            AccessRole::Public => "Public",
            AccessRole::Admin => "Admin",
        }
    }
}

/// Enum of available authorization privileges.
///
/// Each data_store action typically requires a single privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    LookupGuests,
    RespondToInvitation,
    CheckInGuests,
    ManageGuests,
    ViewReports,
    ManageAdmins,
}

impl Privilege {
    /// Get the list of [AccessRole]s that qualify for this privilege. Each returned role is
    /// individually sufficient for the privilege.
    ///
    /// This is function is our source of truth for authorization!
    pub fn qualifying_roles(&self) -> &'static [AccessRole] {
        match self {
            Privilege::LookupGuests => &[AccessRole::Public, AccessRole::Admin],
            Privilege::RespondToInvitation => &[AccessRole::Public, AccessRole::Admin],
            Privilege::CheckInGuests => &[AccessRole::Public, AccessRole::Admin],
            Privilege::ManageGuests => &[AccessRole::Admin],
            Privilege::ViewReports => &[AccessRole::Admin],
            Privilege::ManageAdmins => &[AccessRole::Admin],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_token_privileges() {
        let token = AuthToken::public();
        assert!(token.has_privilege(Privilege::LookupGuests));
        assert!(token.has_privilege(Privilege::CheckInGuests));
        assert!(!token.has_privilege(Privilege::ManageGuests));
        assert!(matches!(
            token.check_privilege(Privilege::ViewReports),
            Err(StoreError::PermissionDenied {
                required_privilege: Privilege::ViewReports
            })
        ));
        assert_eq!(token.admin_id(), None);
    }

    #[test]
    fn test_admin_token_privileges() {
        let token = AuthToken::create_for_admin_session(7);
        assert!(token.has_privilege(Privilege::ManageGuests));
        assert!(token.has_privilege(Privilege::RespondToInvitation));
        assert!(token.check_privilege(Privilege::ManageAdmins).is_ok());
        assert_eq!(token.admin_id(), Some(7));
    }
}
