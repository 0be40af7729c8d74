pub use sea_orm_migration::prelude::*;

mod m20260901_090000_profiles;
mod m20260901_100000_wallets;
mod m20260901_110000_finance;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260901_090000_profiles::Migration),
            Box::new(m20260901_100000_wallets::Migration),
            Box::new(m20260901_110000_finance::Migration),
        ]
    }
}
