use redis::RedisResult;
use tracing::debug;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub fn new(connection_string: &str) -> RedisResult<Self> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    /// Fixed-window counter: `true` while `key` has seen at most `limit`
    /// hits since its first hit. The window starts on that first hit and
    /// later hits do not extend it.
    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = window_pipeline(key, window_seconds)
            .query_async(&mut conn)
            .await?;

        debug!(key, count, limit, "Rate limit window");
        Ok(count <= limit)
    }
}

/// `SET NX EX` creates the counter with its TTL only when the key is absent,
/// and `INCR` keeps an existing TTL.
fn window_pipeline(key: &str, window_seconds: i64) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .cmd("SET")
        .arg(key)
        .arg(0)
        .arg("NX")
        .arg("EX")
        .arg(window_seconds)
        .ignore()
        .incr(key, 1);
    pipe
}
