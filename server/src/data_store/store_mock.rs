use crate::data_store::auth_token::{AuthToken, Privilege};
use crate::data_store::models::{
    Admin, CheckIn, Guest, NewAdmin, NewCheckIn, RsvpLogEntry, RsvpStatus,
};
use crate::data_store::password::verify_password_of_account;
use crate::data_store::{AdminId, GuestStore, GuestStoreFacade, StoreError};
use std::sync::Mutex;

/**
 * A mock [GuestStore] implementation for testing.
 *
 * The simulated database consists of the [StoreMockData] structure with vectors of entities. These
 * can be directly modified by the tests.
 *
 * Like the real store, the interface functions of this mock check the privileges of the given
 * [AuthToken]. Apart from that, only entity existence and check-in uniqueness are checked. The
 * [StoreMockData::next_error] attribute can be set to simulate a database error.
 */
#[derive(Default)]
pub struct StoreMock {
    pub data: Mutex<StoreMockData>,
}

impl GuestStore for StoreMock {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn GuestStoreFacade + 'a>, StoreError> {
        Ok(Box::new(StoreMockFacade { store: self }))
    }
}

#[derive(Default)]
pub struct StoreMockData {
    pub guests: Vec<Guest>,
    pub check_ins: Vec<CheckIn>,
    pub rsvp_log: Vec<RsvpLogEntry>,
    pub admins: Vec<Admin>,
    /// If not none, the next call to a store facade method will return this error.
    pub next_error: Option<StoreError>,
    /// Number of facade calls that queried the full guest list
    pub guest_list_queries: usize,
    /// If not none, called once by the next guest list query, after the guests have been read
    pub after_guest_list_query: Option<Box<dyn FnOnce() + Send>>,
}

struct StoreMockFacade<'a> {
    store: &'a StoreMock,
}

impl StoreMockFacade<'_> {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreMockData>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        Ok(data)
    }
}

fn upsert_guest(data: &mut StoreMockData, guest: Guest) -> bool {
    if let Some(existing) = data.guests.iter_mut().find(|g| g.code == guest.code) {
        *existing = guest;
        false
    } else {
        data.guests.push(guest);
        true
    }
}

impl GuestStoreFacade for StoreMockFacade<'_> {
    fn get_guests(&mut self, auth_token: &AuthToken) -> Result<Vec<Guest>, StoreError> {
        auth_token.check_privilege(Privilege::LookupGuests)?;
        let mut data = self.lock()?;
        data.guest_list_queries += 1;
        let mut result = data.guests.clone();
        result.sort_by(|a, b| a.code.cmp(&b.code));
        let hook = data.after_guest_list_query.take();
        drop(data);
        if let Some(hook) = hook {
            hook();
        }
        Ok(result)
    }

    fn get_guest(&mut self, auth_token: &AuthToken, code: &str) -> Result<Guest, StoreError> {
        auth_token.check_privilege(Privilege::LookupGuests)?;
        let data = self.lock()?;
        data.guests
            .iter()
            .find(|g| g.code == code)
            .cloned()
            .ok_or(StoreError::NotExisting)
    }

    fn create_or_update_guest(
        &mut self,
        auth_token: &AuthToken,
        guest: Guest,
    ) -> Result<bool, StoreError> {
        auth_token.check_privilege(Privilege::ManageGuests)?;
        let guest = guest.validated().map_err(StoreError::InvalidInputData)?;
        let mut data = self.lock()?;
        Ok(upsert_guest(&mut data, guest))
    }

    fn import_guests(
        &mut self,
        auth_token: &AuthToken,
        guests: Vec<Guest>,
    ) -> Result<usize, StoreError> {
        auth_token.check_privilege(Privilege::ManageGuests)?;
        let guests = guests
            .into_iter()
            .map(|g| g.validated())
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::InvalidInputData)?;
        let mut data = self.lock()?;
        let mut created = 0;
        for guest in guests {
            if upsert_guest(&mut data, guest) {
                created += 1;
            }
        }
        Ok(created)
    }

    fn delete_guest(&mut self, auth_token: &AuthToken, code: &str) -> Result<(), StoreError> {
        auth_token.check_privilege(Privilege::ManageGuests)?;
        let mut data = self.lock()?;
        let count_before = data.guests.len();
        data.guests.retain(|g| g.code != code);
        if data.guests.len() == count_before {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }

    fn record_rsvp(
        &mut self,
        auth_token: &AuthToken,
        code: &str,
        attendance: RsvpStatus,
    ) -> Result<Guest, StoreError> {
        auth_token.check_privilege(Privilege::RespondToInvitation)?;
        let mut data = self.lock()?;
        let guest = data
            .guests
            .iter_mut()
            .find(|g| g.code == code)
            .ok_or(StoreError::NotExisting)?;
        guest.rsvp_status = attendance;
        let guest = guest.clone();
        let id = data.rsvp_log.len() as i32 + 1;
        data.rsvp_log.push(RsvpLogEntry {
            id,
            logged_at: chrono::Utc::now(),
            code: guest.code.clone(),
            name: guest.name.clone(),
            attendance,
        });
        Ok(guest)
    }

    fn get_rsvp_log(&mut self, auth_token: &AuthToken) -> Result<Vec<RsvpLogEntry>, StoreError> {
        auth_token.check_privilege(Privilege::ViewReports)?;
        Ok(self.lock()?.rsvp_log.clone())
    }

    fn check_in_guest(
        &mut self,
        auth_token: &AuthToken,
        check_in: NewCheckIn,
    ) -> Result<CheckIn, StoreError> {
        auth_token.check_privilege(Privilege::CheckInGuests)?;
        let mut data = self.lock()?;
        if data
            .check_ins
            .iter()
            .any(|c| c.guest_code == check_in.guest_code)
        {
            return Err(StoreError::ConflictEntityExists);
        }
        let result = CheckIn {
            id: data.check_ins.len() as i32 + 1,
            checked_in_at: check_in.checked_in_at,
            guest_code: check_in.guest_code,
            guest_name: check_in.guest_name,
            table_assigned: check_in.table_assigned,
            designation: check_in.designation,
            attendant: check_in.attendant,
        };
        data.check_ins.push(result.clone());
        Ok(result)
    }

    fn get_check_ins(&mut self, auth_token: &AuthToken) -> Result<Vec<CheckIn>, StoreError> {
        auth_token.check_privilege(Privilege::LookupGuests)?;
        Ok(self.lock()?.check_ins.clone())
    }

    fn get_admin(&mut self, auth_token: &AuthToken, admin_id: AdminId) -> Result<Admin, StoreError> {
        auth_token.check_privilege(Privilege::ViewReports)?;
        let data = self.lock()?;
        data.admins
            .iter()
            .find(|a| a.id == admin_id)
            .cloned()
            .ok_or(StoreError::NotExisting)
    }

    fn get_admins(&mut self, auth_token: &AuthToken) -> Result<Vec<Admin>, StoreError> {
        auth_token.check_privilege(Privilege::ManageAdmins)?;
        Ok(self.lock()?.admins.clone())
    }

    fn create_admin(
        &mut self,
        auth_token: &AuthToken,
        admin: NewAdmin,
    ) -> Result<AdminId, StoreError> {
        auth_token.check_privilege(Privilege::ManageAdmins)?;
        let mut data = self.lock()?;
        if data.admins.iter().any(|a| a.username == admin.username) {
            return Err(StoreError::ConflictEntityExists);
        }
        let id = data.admins.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        data.admins.push(Admin {
            id,
            username: admin.username,
            password_hash: admin.password_hash,
            name: admin.name,
        });
        Ok(id)
    }

    fn authenticate_admin(&mut self, username: &str, password: &str) -> Result<Admin, StoreError> {
        let data = self.lock()?;
        let admin = data.admins.iter().find(|a| a.username == username);
        let stored_hash = admin.map(|a| a.password_hash.as_str());
        if !verify_password_of_account(password, stored_hash) {
            return Err(StoreError::NotExisting);
        }
        admin.cloned().ok_or(StoreError::NotExisting)
    }

    fn get_auth_token_for_session(&mut self, admin_id: AdminId) -> Result<AuthToken, StoreError> {
        let data = self.lock()?;
        if data.admins.iter().any(|a| a.id == admin_id) {
            Ok(AuthToken::create_for_admin_session(admin_id))
        } else {
            Err(StoreError::NotExisting)
        }
    }
}
