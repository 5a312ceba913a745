use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, Set};

use crate::db::entities::setting;

/// Retrieves a setting by its key.
pub async fn get_setting(
    db: &DatabaseConnection,
    key: &str,
) -> Result<Option<setting::Model>, DbErr> {
    setting::Entity::find_by_id(key.to_owned()).one(db).await
}

/// Creates or updates a setting.
pub async fn update_setting(db: &DatabaseConnection, key: &str, value: &str) -> Result<(), DbErr> {
    let active_setting = setting::ActiveModel {
        key: Set(key.to_owned()),
        value: Set(value.to_owned()),
        updated_at: Set(Utc::now()),
    };
    setting::Entity::insert(active_setting)
        .on_conflict(
            OnConflict::column(setting::Column::Key)
                .update_columns([setting::Column::Value, setting::Column::UpdatedAt])
                .to_owned(),
        )
        .exec(db)
        .await?;
    Ok(())
}
