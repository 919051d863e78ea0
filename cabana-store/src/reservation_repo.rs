use async_trait::async_trait;
use cabana_core::{Reservation, ReservationRepository, ReservationStatus, StoreError};
use cabana_shared::pii::Masked;
use cabana_shared::DateRange;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

pub struct PgReservationRepository {
    pool: PgPool,
}

impl PgReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    cabana_id: Uuid,
    cliente_id: Uuid,
    fecha_inicio: NaiveDate,
    fecha_fin: NaiveDate,
    huespedes: i32,
    comentarios: String,
    precio_final: i64,
    estado: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReservationRow {
    fn into_reservation(self) -> Result<Reservation, StoreError> {
        let status = ReservationStatus::parse(&self.estado).ok_or_else(|| {
            StoreError::Backend(format!("unknown reservation status '{}'", self.estado))
        })?;

        Ok(Reservation {
            id: self.id,
            cabin_id: self.cabana_id,
            customer_id: self.cliente_id,
            check_in: self.fecha_inicio,
            check_out: self.fecha_fin,
            guests: self.huespedes.max(0) as u32,
            notes: Masked(self.comentarios),
            total_centavos: self.precio_final,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, cabana_id, cliente_id, fecha_inicio, fecha_fin, huespedes, \
                              comentarios, precio_final, estado, created_at, updated_at";

/// The exclusion constraint `reservas_no_overlap` fires with SQLSTATE 23P01
/// when a calendar-blocking insert or update overlaps an existing row.
fn is_overlap_violation(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Database(db) if matches!(db.code().as_deref(), Some("23P01") | Some("23505"))
    )
}

#[async_trait]
impl ReservationRepository for PgReservationRepository {
    async fn insert_pending(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        // Fast path: lock and report an existing conflict before attempting
        // the insert. The exclusion constraint below remains the authority
        // when two creates race past this check.
        let existing: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM reservas \
             WHERE cabana_id = $1 AND estado IN ('pendiente', 'confirmada') \
               AND fecha_inicio < $2 AND fecha_fin > $3 \
             LIMIT 1 FOR UPDATE",
        )
        .bind(reservation.cabin_id)
        .bind(reservation.check_out)
        .bind(reservation.check_in)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        if existing.is_some() {
            return Err(StoreError::Conflict);
        }

        let insert = sqlx::query(
            "INSERT INTO reservas \
             (id, cabana_id, cliente_id, fecha_inicio, fecha_fin, huespedes, comentarios, \
              precio_final, estado, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(reservation.id)
        .bind(reservation.cabin_id)
        .bind(reservation.customer_id)
        .bind(reservation.check_in)
        .bind(reservation.check_out)
        .bind(reservation.guests as i32)
        .bind(reservation.notes.0.clone())
        .bind(reservation.total_centavos)
        .bind(reservation.status.as_str())
        .bind(reservation.created_at)
        .bind(reservation.updated_at)
        .execute(&mut *tx)
        .await;

        match insert {
            Ok(_) => {
                tx.commit()
                    .await
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
                Ok(())
            }
            Err(e) if is_overlap_violation(&e) => {
                debug!(reservation_id = %reservation.id, "insert lost the overlap race");
                Err(StoreError::Conflict)
            }
            Err(e) => Err(StoreError::Backend(e.to_string())),
        }
    }

    async fn get_reservation(&self, id: Uuid) -> Result<Option<Reservation>, StoreError> {
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservas WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        row.map(ReservationRow::into_reservation).transpose()
    }

    async fn find_blocking_overlaps(
        &self,
        cabin_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<Reservation>, StoreError> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservas \
             WHERE cabana_id = $1 AND estado IN ('pendiente', 'confirmada') \
               AND fecha_inicio < $2 AND fecha_fin > $3",
            SELECT_COLUMNS
        ))
        .bind(cabin_id)
        .bind(range.end())
        .bind(range.start())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        rows.into_iter()
            .map(ReservationRow::into_reservation)
            .collect()
    }

    async fn transition_status(
        &self,
        id: Uuid,
        allowed_from: &[ReservationStatus],
        to: ReservationStatus,
    ) -> Result<bool, StoreError> {
        let from: Vec<String> = allowed_from.iter().map(|s| s.as_str().to_string()).collect();

        let result = sqlx::query(
            "UPDATE reservas SET estado = $2, updated_at = NOW() \
             WHERE id = $1 AND estado = ANY($3)",
        )
        .bind(id)
        .bind(to.as_str())
        .bind(&from)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // Distinguish "guard did not match" from "no such row".
        let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM reservas WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        match exists {
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound(format!("reservation {}", id))),
        }
    }

    async fn list_pending_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, StoreError> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservas WHERE estado = 'pendiente' AND created_at < $1",
            SELECT_COLUMNS
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        rows.into_iter()
            .map(ReservationRow::into_reservation)
            .collect()
    }
}
