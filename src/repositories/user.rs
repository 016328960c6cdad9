//! # User Repository

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::user::{self, ActiveModel as UserActiveModel, Model as UserModel, UserRole};
use crate::models::{Apartment, User, Vehicle, VehicleLog, vehicle};
use crate::validation::{is_valid_email, is_valid_phone};

/// Data required to create a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub role: UserRole,
    pub apartment_id: Option<Uuid>,
}

/// Partial update of a user; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    /// `Some(None)` moves the user out of their apartment
    pub apartment_id: Option<Option<Uuid>>,
}

/// Repository for user accounts
pub struct UserRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a new user after validating contact details
    pub async fn create(&self, request: NewUser) -> Result<UserModel, RepositoryError> {
        let full_name = validate_full_name(&request.full_name)?;
        let email = normalize_email(&request.email)?;
        validate_phone(&request.phone)?;

        self.ensure_email_free(&email, None).await?;
        if let Some(apartment_id) = request.apartment_id {
            self.ensure_apartment_exists(apartment_id).await?;
        }

        let now = Utc::now();
        let user = UserActiveModel {
            id: Set(Uuid::new_v4()),
            full_name: Set(full_name),
            email: Set(email),
            phone: Set(request.phone.trim().to_string()),
            role: Set(request.role),
            apartment_id: Set(request.apartment_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let created = user.insert(self.db).await?;
        tracing::info!(user_id = %created.id, role = ?created.role, "User created");
        Ok(created)
    }

    pub async fn find(&self, user_id: Uuid) -> Result<Option<UserModel>, RepositoryError> {
        Ok(User::find_by_id(user_id).one(self.db).await?)
    }

    /// Get a user or fail with `USER_NOT_FOUND`
    pub async fn get(&self, user_id: Uuid) -> Result<UserModel, RepositoryError> {
        self.find(user_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("USER_NOT_FOUND", "user not found"))
    }

    pub async fn list(&self) -> Result<Vec<UserModel>, RepositoryError> {
        Ok(User::find()
            .order_by_asc(user::Column::FullName)
            .order_by_asc(user::Column::Id)
            .all(self.db)
            .await?)
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        changes: UserChanges,
    ) -> Result<UserModel, RepositoryError> {
        let user = self.get(user_id).await?;
        let mut active = user.into_active_model();

        if let Some(full_name) = changes.full_name {
            active.full_name = Set(validate_full_name(&full_name)?);
        }
        if let Some(email) = changes.email {
            let email = normalize_email(&email)?;
            self.ensure_email_free(&email, Some(user_id)).await?;
            active.email = Set(email);
        }
        if let Some(phone) = changes.phone {
            validate_phone(&phone)?;
            active.phone = Set(phone.trim().to_string());
        }
        if let Some(role) = changes.role {
            active.role = Set(role);
        }
        if let Some(apartment_id) = changes.apartment_id {
            if let Some(apartment_id) = apartment_id {
                self.ensure_apartment_exists(apartment_id).await?;
            }
            active.apartment_id = Set(apartment_id);
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(self.db).await?)
    }

    /// Delete a user together with everything they own.
    ///
    /// Gate logs are never deleted, so a user whose vehicle has passed the
    /// gate cannot be removed.
    pub async fn delete(&self, user_id: Uuid) -> Result<(), RepositoryError> {
        let user = self.get(user_id).await?;

        let gate_entries = VehicleLog::find()
            .inner_join(Vehicle)
            .filter(vehicle::Column::OwnerId.eq(user_id))
            .count(self.db)
            .await?;
        if gate_entries > 0 {
            return Err(RepositoryError::conflict(
                "USER_HAS_GATE_HISTORY",
                "user's vehicle has gate history and cannot be deleted",
            ));
        }

        User::delete_by_id(user.id).exec(self.db).await?;
        tracing::info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    async fn ensure_email_free(
        &self,
        email: &str,
        except: Option<Uuid>,
    ) -> Result<(), RepositoryError> {
        let mut query = User::find().filter(user::Column::Email.eq(email));
        if let Some(user_id) = except {
            query = query.filter(user::Column::Id.ne(user_id));
        }

        if query.count(self.db).await? > 0 {
            return Err(RepositoryError::conflict(
                "EMAIL_TAKEN",
                "email is already registered",
            ));
        }
        Ok(())
    }

    async fn ensure_apartment_exists(&self, apartment_id: Uuid) -> Result<(), RepositoryError> {
        Apartment::find_by_id(apartment_id)
            .one(self.db)
            .await?
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found("APARTMENT_NOT_FOUND", "apartment not found"))
    }
}

fn validate_full_name(full_name: &str) -> Result<String, RepositoryError> {
    let trimmed = full_name.trim();
    if trimmed.is_empty() {
        return Err(RepositoryError::validation("full_name cannot be empty"));
    }
    if trimmed.len() > 255 {
        return Err(RepositoryError::validation(
            "full_name cannot exceed 255 characters",
        ));
    }
    Ok(trimmed.to_string())
}

fn normalize_email(email: &str) -> Result<String, RepositoryError> {
    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(RepositoryError::validation("email is not valid"));
    }
    Ok(email)
}

fn validate_phone(phone: &str) -> Result<(), RepositoryError> {
    if !is_valid_phone(phone) {
        return Err(RepositoryError::validation("phone number is not valid"));
    }
    Ok(())
}
