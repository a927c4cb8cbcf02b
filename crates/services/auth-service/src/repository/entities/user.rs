//! User database entity for SeaORM.

use sea_orm::entity::prelude::*;

use common::AppError;
use domain::{RoleSet, User};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub patronymic: String,
    #[sea_orm(unique)]
    pub email: String,
    /// Role names as a JSON array
    #[sea_orm(column_type = "JsonBinary")]
    pub roles: Json,
    pub password_hash: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert a row to the domain entity. Fails if the roles column is corrupt.
impl TryFrom<Model> for User {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let roles: RoleSet = serde_json::from_value(model.roles).map_err(|e| {
            AppError::storage(format!("undecodable roles for user {}: {}", model.id, e))
        })?;

        Ok(User {
            id: model.id,
            name: model.name,
            surname: model.surname,
            patronymic: model.patronymic,
            email: model.email,
            roles,
            password_hash: model.password_hash,
            created_at: model.created_at,
        })
    }
}
