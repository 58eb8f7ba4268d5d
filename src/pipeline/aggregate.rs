use crate::state::data::{ShoppingItem, ShoppingStatistics};

/// Summarize the whole, unfiltered collection.
/// An empty collection gives all zeros.
pub fn statistics(items: &[ShoppingItem]) -> ShoppingStatistics {
    let mut stats = ShoppingStatistics {
        total_items: items.len(),
        ..ShoppingStatistics::default()
    };

    for item in items {
        let line_total = item.line_total();
        stats.estimated_cost += line_total;
        if item.is_bought {
            stats.bought_items += 1;
            stats.total_cost += line_total;
        }
    }

    stats.pending_items = stats.total_items - stats.bought_items;
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(id: i64, name: &str, quantity: i32, price: f64, is_bought: bool) -> ShoppingItem {
        let mut item = ShoppingItem::new(name, quantity).with_price(price);
        item.id = id;
        item.is_bought = is_bought;
        item
    }

    #[test]
    fn test_empty_collection() {
        assert_eq!(statistics(&[]), ShoppingStatistics::default());
    }

    #[test]
    fn test_milk_and_soap() {
        let items = vec![
            item(1, "Milk", 2, 1.50, false),
            item(2, "Soap", 1, 3.00, true),
        ];

        let stats = statistics(&items);
        assert_eq!(stats.total_items, 2);
        assert_eq!(stats.bought_items, 1);
        assert_eq!(stats.pending_items, 1);
        assert_eq!(stats.total_cost, 3.00);
        assert_eq!(stats.estimated_cost, 6.00);
    }

    fn arb_items() -> impl Strategy<Value = Vec<ShoppingItem>> {
        proptest::collection::vec((1..20i32, 0..10_000u32, any::<bool>()), 0..40).prop_map(
            |rows| {
                rows.into_iter()
                    .enumerate()
                    .map(|(i, (quantity, cents, is_bought))| {
                        item(i as i64 + 1, "Thing", quantity, f64::from(cents) / 100.0, is_bought)
                    })
                    .collect::<Vec<_>>()
            },
        )
    }

    proptest! {
        #[test]
        fn test_counts_and_costs_hold_for_any_list(items in arb_items()) {
            let stats = statistics(&items);

            prop_assert_eq!(stats.total_items, items.len());
            prop_assert_eq!(stats.pending_items + stats.bought_items, stats.total_items);
            prop_assert_eq!(stats.bought_items, items.iter().filter(|i| i.is_bought).count());
            prop_assert!(stats.estimated_cost >= stats.total_cost);
            prop_assert!(stats.total_cost >= 0.0);
            prop_assert!(stats.total_cost.is_sign_positive());
        }
    }
}
