use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::types::Json;
use sqlx::PgPool;
use transfer_core::{BookingStore, ConfirmedBooking, RecordId, SaveOutcome, StoreError};
use uuid::Uuid;

/// Confirmed bookings in Postgres. The full booking is kept as JSONB next
/// to the columns the dispatch screens filter on.
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        sqlx::Error::Database(db) => StoreError::Rejected(db.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    payload: Json<ConfirmedBooking>,
}

impl BookingRow {
    fn into_booking(self) -> ConfirmedBooking {
        let record_id = RecordId(self.id.to_string());
        self.payload.0.with_record_id(record_id)
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn save(&self, booking: &ConfirmedBooking) -> Result<SaveOutcome, StoreError> {
        let outbound = booking
            .outbound()
            .ok_or_else(|| StoreError::Rejected("booking has no outbound leg".into()))?;
        let trip_type = if booking.draft.is_round_trip() { "ROUND_TRIP" } else { "ONE_WAY" };

        // On a replayed key the no-op update makes RETURNING yield the
        // original row instead of nothing. xmax is 0 only for a fresh insert.
        let (id, inserted): (Uuid, bool) = sqlx::query_as(
            r#"
            INSERT INTO bookings (
                id, idempotency_key, reference, origin, destination, vehicle_class, trip_type,
                pickup_date, pickup_time, total_cents, customer_email, user_id, payload, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (idempotency_key) DO UPDATE SET idempotency_key = EXCLUDED.idempotency_key
            RETURNING id, (xmax = 0) AS inserted
            "#,
        )
        .bind(booking.id)
        .bind(booking.idempotency_key)
        .bind(booking.reference())
        .bind(&outbound.origin)
        .bind(&outbound.destination)
        .bind(booking.draft.vehicle_class.as_deref().unwrap_or_default())
        .bind(trip_type)
        .bind(outbound.date)
        .bind(outbound.time)
        .bind(booking.price.cents())
        .bind(booking.draft.contact.email.expose().as_str())
        .bind(booking.user_id.as_deref())
        .bind(Json(booking))
        .bind(booking.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        let record_id = RecordId(id.to_string());
        if inserted {
            Ok(SaveOutcome::Created(record_id))
        } else {
            tracing::info!(key = %booking.idempotency_key, record_id = %id, "Duplicate save, returning existing record");
            Ok(SaveOutcome::Existing(record_id))
        }
    }

    async fn find_by_key(&self, idempotency_key: Uuid) -> Result<Option<ConfirmedBooking>, StoreError> {
        let row: Option<BookingRow> = sqlx::query_as("SELECT id, payload FROM bookings WHERE idempotency_key = $1")
            .bind(idempotency_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(row.map(BookingRow::into_booking))
    }

    async fn get(&self, record_id: &RecordId) -> Result<Option<ConfirmedBooking>, StoreError> {
        let Ok(id) = Uuid::parse_str(&record_id.0) else {
            return Ok(None);
        };

        let row: Option<BookingRow> = sqlx::query_as("SELECT id, payload FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(row.map(BookingRow::into_booking))
    }

    async fn list_for_date(&self, date: NaiveDate) -> Result<Vec<ConfirmedBooking>, StoreError> {
        let rows: Vec<BookingRow> =
            sqlx::query_as("SELECT id, payload FROM bookings WHERE pickup_date = $1 ORDER BY pickup_time")
                .bind(date)
                .fetch_all(&self.pool)
                .await
                .map_err(store_error)?;

        Ok(rows.into_iter().map(BookingRow::into_booking).collect())
    }
}
