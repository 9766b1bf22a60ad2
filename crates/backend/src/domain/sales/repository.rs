use sea_orm::entity::prelude::*;
use sea_orm::{NotSet, PaginatorTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};

use crate::shared::data::db::get_connection;

/// One row of the `sales` table. Rows are created in bulk during an upload
/// and never updated or deleted afterwards.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub date: Option<Date>,
    pub product_name: String,
    pub quantity: i32,
    pub cost_price: f64,
    pub selling_price: f64,
    pub payment_method: String,
    pub mpesa_transaction_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// A normalized sale ready for insertion; the id is assigned by storage.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub date: Option<Date>,
    pub product_name: String,
    pub quantity: i32,
    pub cost_price: f64,
    pub selling_price: f64,
    pub payment_method: String,
    pub mpesa_transaction_id: String,
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

/// Insert the whole batch in one transaction. Any failure rolls the batch
/// back; partial uploads never reach storage.
pub async fn insert_batch(rows: Vec<NewSale>) -> anyhow::Result<usize> {
    if rows.is_empty() {
        return Ok(0);
    }
    let inserted = rows.len();

    let models: Vec<ActiveModel> = rows
        .into_iter()
        .map(|r| ActiveModel {
            id: NotSet,
            date: Set(r.date),
            product_name: Set(r.product_name),
            quantity: Set(r.quantity),
            cost_price: Set(r.cost_price),
            selling_price: Set(r.selling_price),
            payment_method: Set(r.payment_method),
            mpesa_transaction_id: Set(r.mpesa_transaction_id),
        })
        .collect();

    let txn = conn().begin().await?;
    Entity::insert_many(models).exec(&txn).await?;
    txn.commit().await?;

    Ok(inserted)
}

/// Total row count via a direct COUNT query.
pub async fn count_all() -> anyhow::Result<u64> {
    let total = Entity::find().count(conn()).await?;
    Ok(total)
}
