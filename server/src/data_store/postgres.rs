use super::{models, schema, AdminId, GuestStore, GuestStoreFacade, StoreError};
use crate::data_store::auth_token::{AuthToken, Privilege};
use crate::data_store::password::verify_password_of_account;
use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;

#[derive(Clone)]
pub struct PgDataStore {
    pool: diesel::r2d2::Pool<diesel::r2d2::ConnectionManager<PgConnection>>,
}

impl PgDataStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        let connection_manager = diesel::r2d2::ConnectionManager::<PgConnection>::new(database_url);
        Ok(Self {
            pool: diesel::r2d2::Pool::builder()
                .test_on_check_out(true)
                .min_idle(Some(2))
                .build(connection_manager)?,
        })
    }
}

impl GuestStore for PgDataStore {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn GuestStoreFacade + 'a>, StoreError> {
        Ok(Box::new(PgDataStoreFacade::with_pooled_connection(
            self.pool.get()?,
        )))
    }
}

pub struct PgDataStoreFacade {
    connection: diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
}

impl PgDataStoreFacade {
    pub fn with_pooled_connection(
        connection: diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
    ) -> Self {
        Self { connection }
    }
}

/// Insert the guest or update all attributes of the existing guest with the same code. Returns
/// true if the guest has been created.
fn upsert_guest(connection: &mut PgConnection, guest: &models::Guest) -> Result<bool, StoreError> {
    use schema::guests::dsl::*;

    let existing = diesel::select(exists(guests.filter(code.eq(&guest.code))))
        .get_result::<bool>(connection)?;
    if existing {
        diesel::update(guests)
            .filter(code.eq(&guest.code))
            .set(guest)
            .execute(connection)?;
    } else {
        diesel::insert_into(guests)
            .values(guest)
            .execute(connection)?;
    }
    Ok(!existing)
}

impl GuestStoreFacade for PgDataStoreFacade {
    fn get_guests(&mut self, auth_token: &AuthToken) -> Result<Vec<models::Guest>, StoreError> {
        use schema::guests::dsl::*;
        auth_token.check_privilege(Privilege::LookupGuests)?;

        guests
            .order_by(code.asc())
            .select(models::Guest::as_select())
            .load::<models::Guest>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn get_guest(
        &mut self,
        auth_token: &AuthToken,
        guest_code: &str,
    ) -> Result<models::Guest, StoreError> {
        use schema::guests::dsl::*;
        auth_token.check_privilege(Privilege::LookupGuests)?;

        guests
            .filter(code.eq(guest_code))
            .select(models::Guest::as_select())
            .first::<models::Guest>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_or_update_guest(
        &mut self,
        auth_token: &AuthToken,
        guest: models::Guest,
    ) -> Result<bool, StoreError> {
        auth_token.check_privilege(Privilege::ManageGuests)?;
        let guest = guest.validated().map_err(StoreError::InvalidInputData)?;

        self.connection
            .transaction(|connection| upsert_guest(connection, &guest))
    }

    fn import_guests(
        &mut self,
        auth_token: &AuthToken,
        new_guests: Vec<models::Guest>,
    ) -> Result<usize, StoreError> {
        auth_token.check_privilege(Privilege::ManageGuests)?;
        let new_guests = new_guests
            .into_iter()
            .map(|g| g.validated())
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::InvalidInputData)?;

        self.connection.transaction(|connection| {
            let mut created = 0;
            for guest in new_guests.iter() {
                if upsert_guest(connection, guest)? {
                    created += 1;
                }
            }
            Ok(created)
        })
    }

    fn delete_guest(&mut self, auth_token: &AuthToken, guest_code: &str) -> Result<(), StoreError> {
        use schema::guests::dsl::*;
        auth_token.check_privilege(Privilege::ManageGuests)?;

        let count = diesel::delete(guests)
            .filter(code.eq(guest_code))
            .execute(&mut self.connection)?;
        if count == 0 {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }

    fn record_rsvp(
        &mut self,
        auth_token: &AuthToken,
        guest_code: &str,
        attendance: models::RsvpStatus,
    ) -> Result<models::Guest, StoreError> {
        use schema::guests::dsl::*;
        auth_token.check_privilege(Privilege::RespondToInvitation)?;

        self.connection.transaction(|connection| {
            let guest = diesel::update(guests)
                .filter(code.eq(guest_code))
                .set(rsvp_status.eq(attendance))
                .returning(models::Guest::as_returning())
                .get_result::<models::Guest>(connection)?;

            diesel::insert_into(schema::rsvp_log::table)
                .values(models::NewRsvpLogEntry {
                    logged_at: chrono::Utc::now(),
                    code: guest.code.clone(),
                    name: guest.name.clone(),
                    attendance,
                })
                .execute(connection)?;

            Ok(guest)
        })
    }

    fn get_rsvp_log(
        &mut self,
        auth_token: &AuthToken,
    ) -> Result<Vec<models::RsvpLogEntry>, StoreError> {
        use schema::rsvp_log::dsl::*;
        auth_token.check_privilege(Privilege::ViewReports)?;

        rsvp_log
            .order_by((logged_at.asc(), id.asc()))
            .select(models::RsvpLogEntry::as_select())
            .load::<models::RsvpLogEntry>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn check_in_guest(
        &mut self,
        auth_token: &AuthToken,
        check_in: models::NewCheckIn,
    ) -> Result<models::CheckIn, StoreError> {
        use schema::check_ins::dsl::*;
        auth_token.check_privilege(Privilege::CheckInGuests)?;

        // Serializable isolation makes the pre-check and the insert atomic with respect to
        // concurrent check-ins of the same guest. The loser gets a TransactionConflict.
        self.connection
            .build_transaction()
            .serializable()
            .run(|connection| {
                let already_checked_in =
                    diesel::select(exists(check_ins.filter(guest_code.eq(&check_in.guest_code))))
                        .get_result::<bool>(connection)?;
                if already_checked_in {
                    return Err(StoreError::ConflictEntityExists);
                }
                Ok(diesel::insert_into(check_ins)
                    .values(&check_in)
                    .returning(models::CheckIn::as_returning())
                    .get_result::<models::CheckIn>(connection)?)
            })
    }

    fn get_check_ins(
        &mut self,
        auth_token: &AuthToken,
    ) -> Result<Vec<models::CheckIn>, StoreError> {
        use schema::check_ins::dsl::*;
        auth_token.check_privilege(Privilege::LookupGuests)?;

        check_ins
            .order_by((checked_in_at.asc(), id.asc()))
            .select(models::CheckIn::as_select())
            .load::<models::CheckIn>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn get_admin(
        &mut self,
        auth_token: &AuthToken,
        admin_id: AdminId,
    ) -> Result<models::Admin, StoreError> {
        use schema::admins::dsl::*;
        auth_token.check_privilege(Privilege::ViewReports)?;

        admins
            .filter(id.eq(admin_id))
            .select(models::Admin::as_select())
            .first::<models::Admin>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn get_admins(&mut self, auth_token: &AuthToken) -> Result<Vec<models::Admin>, StoreError> {
        use schema::admins::dsl::*;
        auth_token.check_privilege(Privilege::ManageAdmins)?;

        admins
            .order_by(username.asc())
            .select(models::Admin::as_select())
            .load::<models::Admin>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_admin(
        &mut self,
        auth_token: &AuthToken,
        admin: models::NewAdmin,
    ) -> Result<AdminId, StoreError> {
        use schema::admins::dsl::*;
        auth_token.check_privilege(Privilege::ManageAdmins)?;

        Ok(diesel::insert_into(admins)
            .values(&admin)
            .returning(id)
            .get_result::<AdminId>(&mut self.connection)?)
    }

    fn authenticate_admin(
        &mut self,
        admin_username: &str,
        password: &str,
    ) -> Result<models::Admin, StoreError> {
        use schema::admins::dsl::*;

        let admin = admins
            .filter(username.eq(admin_username))
            .select(models::Admin::as_select())
            .first::<models::Admin>(&mut self.connection)
            .optional()?;
        let stored_hash = admin.as_ref().map(|a| a.password_hash.as_str());
        if !verify_password_of_account(password, stored_hash) {
            return Err(StoreError::NotExisting);
        }
        admin.ok_or(StoreError::NotExisting)
    }

    fn get_auth_token_for_session(&mut self, admin_id: AdminId) -> Result<AuthToken, StoreError> {
        use schema::admins::dsl::*;

        let admin_exists = diesel::select(exists(admins.filter(id.eq(admin_id))))
            .get_result::<bool>(&mut self.connection)?;
        if !admin_exists {
            return Err(StoreError::NotExisting);
        }
        Ok(AuthToken::create_for_admin_session(admin_id))
    }
}
