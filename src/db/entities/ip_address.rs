use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::monitor::registry::MonitoredTarget;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ips")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub ip: String,
    pub hostname: Option<String>,
    pub ports: Option<String>,
    pub status: String, // Administrative state set by users, e.g. "Available"
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    pub subnet: Option<String>,
    pub cidr: Option<String>,
    // Written only by the liveness monitor, always together.
    pub last_status: Option<String>,
    pub last_checked: Option<ChronoDateTimeUtc>,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for MonitoredTarget {
    fn from(model: Model) -> Self {
        MonitoredTarget {
            id: model.id,
            address: model.ip,
            hostname: model.hostname,
        }
    }
}
