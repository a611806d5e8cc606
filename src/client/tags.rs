//! Ownership tags attached to every instance this provider creates.

/// Tag key recording the pool an instance belongs to.
pub const TAG_POOL: &str = "pool";
/// Tag key recording the controller installation that owns an instance.
pub const TAG_CONTROLLER: &str = "controller";

/// Returns the `pool=<pool_id>` tag.
#[must_use]
pub fn pool_tag(pool_id: &str) -> String {
    format!("{TAG_POOL}={pool_id}")
}

/// Returns the `controller=<controller_id>` tag.
#[must_use]
pub fn controller_tag(controller_id: &str) -> String {
    format!("{TAG_CONTROLLER}={controller_id}")
}
