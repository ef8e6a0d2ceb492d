use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

use super::error::RecordError;
use super::row::RecordRow;
use super::traits::RecordStore;

/// One appended metadata row, cells stored as a JSON string array.
pub mod record_row {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "record_rows")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub cells: Json,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Tabular record store backed by a single append-only database table.
pub struct DatabaseRecordStore {
    db: DatabaseConnection,
}

impl DatabaseRecordStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordStore for DatabaseRecordStore {
    async fn read_all(&self) -> Result<Vec<Vec<String>>, RecordError> {
        let models = record_row::Entity::find()
            .order_by_asc(record_row::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| RecordError::Read(e.to_string()))?;

        // A row whose cells column is not an array is malformed; skip it
        // rather than failing the read.
        Ok(models
            .into_iter()
            .filter_map(|model| match model.cells {
                serde_json::Value::Array(values) => Some(
                    values
                        .into_iter()
                        .map(|value| match value {
                            serde_json::Value::String(s) => s,
                            other => other.to_string(),
                        })
                        .collect(),
                ),
                _ => None,
            })
            .collect())
    }

    async fn append(&self, row: &RecordRow) -> Result<(), RecordError> {
        let cells = serde_json::to_value(row.to_cells())
            .map_err(|e| RecordError::Append(e.to_string()))?;
        record_row::ActiveModel {
            cells: Set(cells),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| RecordError::Append(e.to_string()))?;
        Ok(())
    }
}
