//! What a saga hands back to its caller.

use common::{Notification, StockCheckReply};
use serde::{Deserialize, Serialize};

/// Aggregate result of a completed saga.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: i64,
    pub status: String,
    /// Units checked and placed.
    pub quantity: u32,
    pub stock_check: StockCheckReply,
    /// The notification that was attempted.
    pub notification: Notification,
    /// False if publishing the notification failed.
    pub notification_delivered: bool,
}

/// The stock responder said no.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRejection {
    pub order_id: i64,
    /// Units that were asked for.
    pub quantity: u32,
    pub stock_check: StockCheckReply,
    /// Failure notification, if one was published.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
}

/// Every non-error way a saga can end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SagaOutcome {
    Completed(OrderConfirmation),
    StockUnavailable(StockRejection),
}

impl SagaOutcome {
    pub fn order_id(&self) -> i64 {
        match self {
            SagaOutcome::Completed(confirmation) => confirmation.order_id,
            SagaOutcome::StockUnavailable(rejection) => rejection.order_id,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, SagaOutcome::Completed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_wire_shape() {
        let confirmation = OrderConfirmation {
            order_id: 1,
            status: "Order processed successfully".to_string(),
            quantity: 3,
            stock_check: StockCheckReply {
                product_id: 101,
                is_available: true,
            },
            notification: Notification::order_placed(7),
            notification_delivered: true,
        };

        let json = serde_json::to_value(&confirmation).unwrap();
        assert_eq!(json["order_id"], 1);
        assert_eq!(json["quantity"], 3);
        assert_eq!(json["stock_check"]["is_available"], true);
        assert_eq!(json["notification"]["message"], "order placed");
    }

    #[test]
    fn rejection_omits_missing_notification() {
        let rejection = StockRejection {
            order_id: 2,
            quantity: 1,
            stock_check: StockCheckReply {
                product_id: 103,
                is_available: false,
            },
            notification: None,
        };

        let json = serde_json::to_value(&rejection).unwrap();
        assert!(json.get("notification").is_none());
        assert_eq!(SagaOutcome::StockUnavailable(rejection).order_id(), 2);
    }
}
