// calliope_ledger/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)] // Never send password hash to client
    pub password_hash: String,
    pub is_admin: bool,
    pub name: String,
    pub email_address: String,
    pub phone: Option<String>,
    pub shipping_address: String,
    pub mailing_address: String,
    pub created_at: DateTime<Utc>,
}

/// A user about to be registered. `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub name: String,
    pub email_address: String,
    pub phone: Option<String>,
    pub shipping_address: String,
    pub mailing_address: String,
}

impl NewUser {
    pub fn into_user(self, id: Uuid, created_at: DateTime<Utc>) -> User {
        User {
            id,
            username: self.username,
            password_hash: self.password_hash,
            is_admin: self.is_admin,
            name: self.name,
            email_address: self.email_address,
            phone: self.phone,
            shipping_address: self.shipping_address,
            mailing_address: self.mailing_address,
            created_at,
        }
    }
}
