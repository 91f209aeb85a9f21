//! Driver position cache backed by a Redis geo set.
//!
//! All drivers live in one well-known key. GEOADD gives upsert semantics
//! (last write wins), GEOPOS is the point lookup, and ZREM deletes an
//! entry because a geo set is a sorted set underneath.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use redis::geo::Coord;

use reparto_core::{Coordinates, UserId};

use super::{CacheError, GeoCache};

/// Redis key holding every driver's most recent position.
const DRIVER_POSITIONS_KEY: &str = "drivers:positions";

/// Geo cache over a shared multiplexed Redis connection.
#[derive(Clone)]
pub struct RedisGeoCache {
    conn: MultiplexedConnection,
}

impl RedisGeoCache {
    /// Create a geo cache over an established connection.
    #[must_use]
    pub const fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl GeoCache for RedisGeoCache {
    async fn upsert(&self, driver_id: UserId, position: Coordinates) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let member = driver_id.to_string();
        let _: i64 = conn
            .geo_add(
                DRIVER_POSITIONS_KEY,
                (Coord::lon_lat(position.lng(), position.lat()), member),
            )
            .await?;
        Ok(())
    }

    async fn position(&self, driver_id: UserId) -> Result<Option<Coordinates>, CacheError> {
        let mut conn = self.conn.clone();
        let member = driver_id.to_string();
        let positions: Vec<Option<Coord<f64>>> =
            conn.geo_pos(DRIVER_POSITIONS_KEY, member).await?;

        let Some(coord) = positions.into_iter().flatten().next() else {
            return Ok(None);
        };

        // GEOPOS reports back what GEOADD stored (within geohash precision),
        // so an out-of-range value here means the key was written by
        // something other than this cache.
        let coords = Coordinates::new(coord.latitude, coord.longitude).map_err(|e| {
            CacheError::DataCorruption(format!("invalid position for driver {driver_id}: {e}"))
        })?;

        Ok(Some(coords))
    }

    async fn remove(&self, driver_id: UserId) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let member = driver_id.to_string();
        let _: i64 = conn.zrem(DRIVER_POSITIONS_KEY, member).await?;
        Ok(())
    }
}
