use serde::Serialize;
use uuid::Uuid;

/// Local user record, keyed by the provider-issued id.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

/// Input of the composite account creation.
#[derive(Debug)]
pub struct NewAccount {
    pub email: String,
    pub password: secrecy::SecretString,
    pub name: String,
}
