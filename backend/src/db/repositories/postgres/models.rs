use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

use super::schema::records;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // Bookkeeping columns are only read by operators
pub struct RecordRow {
    pub collection: String,
    pub record_id: String,
    pub seq: i64,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = records)]
pub struct NewRecordRow {
    pub collection: String,
    pub record_id: String,
    pub data: Value,
}
