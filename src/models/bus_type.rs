use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Static lookup table, seeded by migration
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BusType {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub seat_capacity: i32,
    pub amenities: Vec<String>,
}

impl BusType {
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let bus_types = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM bus_types ORDER BY name
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(bus_types)
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>, sqlx::Error> {
        let bus_type = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM bus_types WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(bus_type)
    }
}
