use chrono::Utc;
use uuid::Uuid;

/// Business id for a new preorder: `{prefix}-{unix_millis}-{8 hex}`.
///
/// The random suffix keeps ids distinct when several orders are placed
/// within the same millisecond.
pub fn new_preorder_id(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", prefix, millis, &suffix[..8])
}
