//! Queries over the `ips` table used by the liveness monitor.
use chrono::{DateTime, Utc};
use sea_orm::prelude::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, UpdateResult,
};

use crate::db::entities::ip_address;
use crate::monitor::status::LivenessStatus;

/// Fields accepted when registering a new address.
#[derive(Debug, Clone, Default)]
pub struct NewIpAddress {
    pub ip: String,
    pub hostname: Option<String>,
    pub ports: Option<String>,
    pub status: Option<String>,
    pub note: Option<String>,
    pub subnet: Option<String>,
    pub cidr: Option<String>,
}

pub async fn create_ip(
    db: &DatabaseConnection,
    data: NewIpAddress,
) -> Result<ip_address::Model, DbErr> {
    let new_ip = ip_address::ActiveModel {
        ip: Set(data.ip),
        hostname: Set(data.hostname),
        ports: Set(data.ports),
        status: Set(data.status.unwrap_or_else(|| "Available".to_string())),
        note: Set(data.note),
        subnet: Set(data.subnet),
        cidr: Set(data.cidr),
        last_status: Set(None),
        last_checked: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    new_ip.insert(db).await
}

/// All rows ordered by id, so consecutive sweeps probe in the same order.
pub async fn list_targets(db: &DatabaseConnection) -> Result<Vec<ip_address::Model>, DbErr> {
    ip_address::Entity::find()
        .order_by_asc(ip_address::Column::Id)
        .all(db)
        .await
}

pub async fn find_by_id(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<ip_address::Model>, DbErr> {
    ip_address::Entity::find_by_id(id).one(db).await
}

/// The same address may exist under several subnets; the oldest row wins.
pub async fn find_by_address(
    db: &DatabaseConnection,
    ip: &str,
) -> Result<Option<ip_address::Model>, DbErr> {
    ip_address::Entity::find()
        .filter(ip_address::Column::Ip.eq(ip))
        .order_by_asc(ip_address::Column::Id)
        .one(db)
        .await
}

/// Writes the liveness pair in a single UPDATE statement.
pub async fn update_liveness(
    db: &DatabaseConnection,
    id: i32,
    status: LivenessStatus,
    checked_at: DateTime<Utc>,
) -> Result<UpdateResult, DbErr> {
    ip_address::Entity::update_many()
        .col_expr(
            ip_address::Column::LastStatus,
            Expr::value(sea_orm::Value::String(Some(Box::new(status.as_str().to_string())))),
        )
        .col_expr(
            ip_address::Column::LastChecked,
            Expr::value(sea_orm::Value::ChronoDateTimeUtc(Some(Box::new(checked_at)))),
        )
        .filter(ip_address::Column::Id.eq(id))
        .exec(db)
        .await
}

/// Most recent `last_checked` across every row.
pub async fn latest_check(db: &DatabaseConnection) -> Result<Option<DateTime<Utc>>, DbErr> {
    let newest = ip_address::Entity::find()
        .filter(ip_address::Column::LastChecked.is_not_null())
        .order_by_desc(ip_address::Column::LastChecked)
        .one(db)
        .await?;
    Ok(newest.and_then(|m| m.last_checked))
}
