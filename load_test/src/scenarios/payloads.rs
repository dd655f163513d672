//! Request payloads for the food-ordering scenario
//!
//! Every string field is derived from one random id per iteration; numeric
//! fields are drawn uniformly from fixed ranges.

use std::ops::Range;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;

pub const RANDOM_ID_RANGE: Range<u32> = 0..10_000;
pub const MENU_PRICE_RANGE: Range<f64> = 10.0..60.0;
pub const ORDER_ITEM_PRICE_RANGE: Range<f64> = 15.0..45.0;
pub const ORDER_TOTAL_RANGE: Range<f64> = 20.0..70.0;
pub const ORDER_QUANTITY_MIN: u32 = 1;
pub const ORDER_QUANTITY_MAX: u32 = 3;

/// Largest accepted multiplier for think times
pub const MAX_THINK_TIME_SCALE: f64 = 1_000.0;

pub const MENU_CATEGORY: &str = "Lanche";
pub const DELIVERY_TYPE: &str = "balcao";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemPayload {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub available: bool,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub menu_item_id: String,
    pub quantity: u32,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub customer_id: String,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub delivery_type: String,
}

pub fn random_id<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(RANDOM_ID_RANGE)
}

pub fn auth_payload(random_id: u32) -> AuthPayload {
    AuthPayload {
        email: format!("funcionario{random_id}@fasttech.com"),
        password: format!("senha{random_id}"),
    }
}

pub fn menu_item_payload<R: Rng + ?Sized>(random_id: u32, rng: &mut R) -> MenuItemPayload {
    MenuItemPayload {
        name: format!("Produto {random_id}"),
        description: format!("Descrição do produto {random_id}"),
        price: rng.gen_range(MENU_PRICE_RANGE),
        available: true,
        category: MENU_CATEGORY.to_string(),
    }
}

/// An order always carries exactly one item. The total is drawn on its own
/// and is not derived from the item price.
pub fn order_payload<R: Rng + ?Sized>(random_id: u32, rng: &mut R) -> OrderPayload {
    let item = OrderItem {
        menu_item_id: format!("item{random_id}"),
        quantity: rng.gen_range(ORDER_QUANTITY_MIN..=ORDER_QUANTITY_MAX),
        price: rng.gen_range(ORDER_ITEM_PRICE_RANGE),
    };

    OrderPayload {
        customer_id: format!("customer{random_id}"),
        items: vec![item],
        total_amount: rng.gen_range(ORDER_TOTAL_RANGE),
        delivery_type: DELIVERY_TYPE.to_string(),
    }
}

/// Uniform pause in `[0, max_secs)` seconds, scaled by `scale`.
///
/// `scale` is clamped to [`MAX_THINK_TIME_SCALE`]; non-finite or
/// non-positive inputs yield no pause.
pub fn think_time<R: Rng + ?Sized>(rng: &mut R, max_secs: f64, scale: f64) -> Duration {
    if !(max_secs.is_finite() && max_secs > 0.0 && scale > 0.0) {
        return Duration::ZERO;
    }
    let scale = scale.min(MAX_THINK_TIME_SCALE);
    Duration::try_from_secs_f64(rng.gen_range(0.0..max_secs) * scale).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_auth_payload_for_known_id() {
        let payload = auth_payload(4242);
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(
            json,
            r#"{"email":"funcionario4242@fasttech.com","password":"senha4242"}"#
        );
    }

    #[test]
    fn test_menu_payload_fields() {
        let mut rng = StdRng::seed_from_u64(1);
        let payload = menu_item_payload(4242, &mut rng);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["name"], "Produto 4242");
        assert_eq!(json["description"], "Descrição do produto 4242");
        assert_eq!(json["available"], true);
        assert_eq!(json["category"], "Lanche");
        assert!(json["price"].is_f64());
    }

    #[test]
    fn test_order_payload_shape() {
        let mut rng = StdRng::seed_from_u64(2);
        let payload = order_payload(4242, &mut rng);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["customerId"], "customer4242");
        assert_eq!(json["deliveryType"], "balcao");
        let items = json["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["menuItemId"], "item4242");
        assert!(items[0]["quantity"].is_u64());
        assert!(json["totalAmount"].is_f64());
    }

    #[test]
    fn test_random_fields_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..10_000 {
            let id = random_id(&mut rng);
            assert!(RANDOM_ID_RANGE.contains(&id));

            let menu = menu_item_payload(id, &mut rng);
            assert!(menu.price >= 10.0 && menu.price < 60.0);

            let order = order_payload(id, &mut rng);
            assert_eq!(order.items.len(), 1);
            let item = &order.items[0];
            assert!((1..=3).contains(&item.quantity));
            assert!(item.price >= 15.0 && item.price < 45.0);
            assert!(order.total_amount >= 20.0 && order.total_amount < 70.0);
        }
    }

    #[test]
    fn test_quantity_covers_whole_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = [false; 3];
        for _ in 0..1_000 {
            let order = order_payload(1, &mut rng);
            seen[(order.items[0].quantity - 1) as usize] = true;
        }
        assert_eq!(seen, [true, true, true]);
    }

    #[test]
    fn test_think_time_bounds() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..1_000 {
            assert!(think_time(&mut rng, 2.0, 1.0) < Duration::from_secs(2));
            assert!(think_time(&mut rng, 3.0, 0.5) < Duration::from_millis(1500));
        }
        assert_eq!(think_time(&mut rng, 2.0, 0.0), Duration::ZERO);
        assert_eq!(think_time(&mut rng, 0.0, 1.0), Duration::ZERO);
    }

    #[test]
    fn test_think_time_huge_scale_is_clamped() {
        let mut rng = StdRng::seed_from_u64(11);
        let cap = Duration::from_secs_f64(2.0 * MAX_THINK_TIME_SCALE);
        for _ in 0..100 {
            assert!(think_time(&mut rng, 2.0, 1e20) < cap);
        }
        assert!(think_time(&mut rng, 2.0, f64::INFINITY) < cap);
        assert_eq!(think_time(&mut rng, 2.0, f64::NAN), Duration::ZERO);
        assert_eq!(think_time(&mut rng, f64::INFINITY, 1.0), Duration::ZERO);
    }
}
