use async_trait::async_trait;
use cabana_catalog::{Cabin, CabinStatus};
use cabana_core::{CabinRepository, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgCabinRepository {
    pool: PgPool,
}

impl PgCabinRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CabinRow {
    id: Uuid,
    slug: String,
    nombre: String,
    team_id: Uuid,
    costo_por_noche: i64,
    capacidad: i32,
    estadia_minima: i32,
    estado: String,
}

impl CabinRow {
    fn into_cabin(self) -> Result<Cabin, StoreError> {
        let status = CabinStatus::parse(&self.estado).ok_or_else(|| {
            StoreError::Backend(format!("unknown cabin status '{}'", self.estado))
        })?;

        Ok(Cabin {
            id: self.id,
            slug: self.slug,
            name: self.nombre,
            team_id: self.team_id,
            nightly_rate_centavos: self.costo_por_noche,
            capacity: self.capacidad.max(0) as u32,
            min_stay_nights: self.estadia_minima.max(0) as u32,
            status,
        })
    }
}

#[async_trait]
impl CabinRepository for PgCabinRepository {
    async fn get_cabin(&self, id: Uuid) -> Result<Option<Cabin>, StoreError> {
        let row: Option<CabinRow> = sqlx::query_as(
            "SELECT id, slug, nombre, team_id, costo_por_noche, capacidad, estadia_minima, estado \
             FROM cabanas WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        row.map(CabinRow::into_cabin).transpose()
    }
}
