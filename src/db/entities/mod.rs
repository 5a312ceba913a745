//! SeaORM entities for the tables the monitor touches.

pub mod ip_address;
pub mod setting;

pub mod prelude {
    pub use super::ip_address::ActiveModel as IpAddressActiveModel;
    pub use super::ip_address::Column as IpAddressColumn;
    pub use super::ip_address::Entity as IpAddress;
    pub use super::ip_address::Model as IpAddressModel;

    pub use super::setting::ActiveModel as SettingActiveModel;
    pub use super::setting::Column as SettingColumn;
    pub use super::setting::Entity as Setting;
    pub use super::setting::Model as SettingModel;
}
