pub mod entities;
pub mod services;

use sea_orm::{ConnectionTrait, DbErr, Schema};
use tracing::info;

use self::entities::{ip_address, setting};

/// Creates the monitor's tables when they do not exist yet.
pub async fn initialize_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut ips = schema.create_table_from_entity(ip_address::Entity);
    ips.if_not_exists();
    db.execute(backend.build(&ips)).await?;

    let mut settings = schema.create_table_from_entity(setting::Entity);
    settings.if_not_exists();
    db.execute(backend.build(&settings)).await?;

    info!("Database schema is ready.");
    Ok(())
}
