use async_trait::async_trait;
use chrono::NaiveDate;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use transfer_catalog::{AvailabilityLedger, LedgerError, ReservationToken, SlotKey, VehicleClass};

/// Lifetime of a hold key and of the released/committed marker that replaces
/// it. Markers only need to outlive a reserve still in flight.
const HOLD_TTL_SECONDS: u64 = 24 * 60 * 60;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    pub async fn connection(&self) -> Result<MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    pub async fn ping(&self) -> Result<(), redis::RedisError> {
        let mut conn = self.connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

fn slot_key(slot: &SlotKey) -> String {
    format!("slot:{}:{:02}:{}", slot.date, slot.hour, slot.vehicle_class)
}

fn hold_key(token: &ReservationToken) -> String {
    format!("hold:{}", token.id)
}

fn backend(e: redis::RedisError) -> LedgerError {
    tracing::error!("Redis ledger failure: {}", e);
    LedgerError::Backend(e.to_string())
}

/// Availability ledger shared by every API instance. Each operation is a
/// single Lua script, so the check and the increment happen atomically on
/// the server.
#[derive(Clone)]
pub struct RedisLedger {
    redis: RedisClient,
}

impl RedisLedger {
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }

    async fn count(&self, slot: &SlotKey) -> Result<u32, LedgerError> {
        let mut conn = self.redis.connection().await.map_err(backend)?;
        let used: Option<u32> = conn.get(slot_key(slot)).await.map_err(backend)?;
        Ok(used.unwrap_or(0))
    }
}

#[async_trait]
impl AvailabilityLedger for RedisLedger {
    async fn check_available(&self, date: NaiveDate, hour: u32, vehicle: &VehicleClass) -> Result<bool, LedgerError> {
        let slot = SlotKey::new(date, hour, vehicle.id.as_str())?;
        Ok(self.count(&slot).await? < vehicle.max_capacity_per_hour)
    }

    async fn reserve(&self, token: &ReservationToken, vehicle: &VehicleClass) -> Result<(), LedgerError> {
        let slot = SlotKey::new(token.slot.date, token.slot.hour, vehicle.id.as_str())?;
        let capacity = vehicle.max_capacity_per_hour;

        // New count on success, -1 when the slot is full, -2 when the token
        // was already released or committed, -3 when it is already held.
        let script = redis::Script::new(
            r#"
            local state = redis.call("GET", KEYS[2])
            if state then
                if state == KEYS[1] then
                    return -3
                end
                return -2
            end
            local used = tonumber(redis.call("GET", KEYS[1]) or "0")
            if used >= tonumber(ARGV[1]) then
                return -1
            end
            used = redis.call("INCR", KEYS[1])
            redis.call("SET", KEYS[2], KEYS[1], "EX", ARGV[2])
            return used
        "#,
        );

        let mut conn = self.redis.connection().await.map_err(backend)?;
        let used: i64 = script
            .key(slot_key(&slot))
            .key(hold_key(token))
            .arg(capacity)
            .arg(HOLD_TTL_SECONDS)
            .invoke_async(&mut conn)
            .await
            .map_err(backend)?;

        match used {
            -1 => Err(LedgerError::CapacityExhausted {
                date: slot.date,
                hour: slot.hour,
                vehicle_class: vehicle.id.clone(),
                capacity,
            }),
            -2 => Err(LedgerError::AlreadySettled(token.id)),
            -3 => Ok(()),
            used => {
                tracing::debug!(slot = %slot, used, capacity, "Reserved capacity");
                Ok(())
            }
        }
    }

    async fn release(&self, token: &ReservationToken) -> Result<(), LedgerError> {
        // Only a live hold gives capacity back. A release that finds no hold
        // leaves a marker so a reserve still in flight for the token is refused.
        let script = redis::Script::new(
            r#"
            local state = redis.call("GET", KEYS[1])
            if state == KEYS[2] then
                redis.call("SET", KEYS[1], "released", "EX", ARGV[1])
                local used = tonumber(redis.call("GET", KEYS[2]) or "0")
                if used > 0 then
                    return redis.call("DECR", KEYS[2])
                end
                return 0
            end
            if not state then
                redis.call("SET", KEYS[1], "released", "EX", ARGV[1])
            end
            return -1
        "#,
        );

        let mut conn = self.redis.connection().await.map_err(backend)?;
        let remaining: i64 = script
            .key(hold_key(token))
            .key(slot_key(&token.slot))
            .arg(HOLD_TTL_SECONDS)
            .invoke_async(&mut conn)
            .await
            .map_err(backend)?;

        if remaining >= 0 {
            tracing::debug!(slot = %token.slot, token = %token.id, "Released capacity");
        }
        Ok(())
    }

    async fn commit(&self, token: &ReservationToken) -> Result<(), LedgerError> {
        let script = redis::Script::new(
            r#"
            if redis.call("GET", KEYS[1]) == KEYS[2] then
                redis.call("SET", KEYS[1], "committed", "EX", ARGV[1])
                return 1
            end
            return 0
        "#,
        );

        let mut conn = self.redis.connection().await.map_err(backend)?;
        let committed: i64 = script
            .key(hold_key(token))
            .key(slot_key(&token.slot))
            .arg(HOLD_TTL_SECONDS)
            .invoke_async(&mut conn)
            .await
            .map_err(backend)?;

        if committed == 0 {
            tracing::warn!(slot = %token.slot, token = %token.id, "Commit found no live hold");
        }
        Ok(())
    }

    async fn used(&self, date: NaiveDate, hour: u32, vehicle_class: &str) -> Result<u32, LedgerError> {
        let slot = SlotKey::new(date, hour, vehicle_class)?;
        self.count(&slot).await
    }
}
