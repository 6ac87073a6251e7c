use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Status assigned to every order at creation. No further transitions exist.
pub const ORDER_STATUS_OPEN: &str = "Open";

/// Represents a customer order as it is persisted in the `orders` collection.
///
/// # Persistence
/// The struct serializes straight into the stored document shape
/// `{_id, emailAddress, product, total, status}`. The `_id` is always generated by
/// [`OrderRepository`](crate::order_repository::OrderRepository); callers only ever
/// supply an [`OrderCreate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email_address: String,
    pub product: String,
    pub total: f64,
    pub status: String,
}

/// Payload for creating a new order.
///
/// Unknown fields (a caller-supplied `id` or `status`) are ignored when this is
/// deserialized, so neither can reach the stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreate {
    pub email_address: String,
    pub product: String,
    pub total: f64,
}

impl OrderCreate {
    pub fn new(email_address: impl Into<String>, product: impl Into<String>, total: f64) -> Self {
        Self {
            email_address: email_address.into(),
            product: product.into(),
            total,
        }
    }
}

impl Order {
    /// Builds an `Open` order from creation parameters and a freshly generated id.
    pub fn open(id: ObjectId, params: OrderCreate) -> Self {
        Self {
            id,
            email_address: params.email_address,
            product: params.product,
            total: params.total,
            status: ORDER_STATUS_OPEN.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;

    #[test]
    fn test_caller_supplied_id_and_status_are_dropped() {
        let json = r#"{
            "id": "not-an-id",
            "emailAddress": "a@b.com",
            "product": "Widget",
            "total": 9.99,
            "status": "Shipped"
        }"#;
        let params: OrderCreate = serde_json::from_str(json).unwrap();
        assert_eq!(params, OrderCreate::new("a@b.com", "Widget", 9.99));

        let order = Order::open(ObjectId::new(), params);
        assert_eq!(order.status, ORDER_STATUS_OPEN);
    }

    #[test]
    fn test_document_shape() {
        let id = ObjectId::new();
        let order = Order::open(id, OrderCreate::new("a@b.com", "Widget", 9.99));
        let doc = bson::to_document(&order).unwrap();

        assert_eq!(doc.get_object_id("_id").unwrap(), id);
        assert_eq!(doc.get_str("emailAddress").unwrap(), "a@b.com");
        assert_eq!(doc.get_str("product").unwrap(), "Widget");
        assert_eq!(doc.get_f64("total").unwrap(), 9.99);
        assert_eq!(doc.get_str("status").unwrap(), "Open");
        assert_eq!(doc.len(), 5);
    }
}
