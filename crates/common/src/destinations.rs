//! Broker destination names shared by the gateway and the workers.

/// Stock-check requests. Every message needs a correlation token and reply address.
pub const CHECK_STOCK: &str = "check_stock";

/// Placed orders. Fire-and-forget.
pub const PLACE_ORDER: &str = "place_order";

/// User notifications. Fire-and-forget, best-effort.
pub const NOTIFICATIONS: &str = "notifications";

/// Prefix of the per-service health check destinations.
pub const HEALTH_CHECK_PREFIX: &str = "health_check";

/// Health check destination for one service, e.g. `health_check.inventory`.
pub fn health_check_for(service: &str) -> String {
    format!("{HEALTH_CHECK_PREFIX}.{service}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_destination_is_namespaced_per_service() {
        assert_eq!(health_check_for("inventory"), "health_check.inventory");
    }
}
