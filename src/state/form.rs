//! Raw text coming from the add/edit item dialog.
//!
//! Numeric fields never fail: unparsable input falls back to a safe
//! default so the save action still goes through.

use super::data::{ItemCategory, ShoppingItem};

/// Field contents of the item dialog, exactly as typed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemForm {
    pub name: String,
    pub quantity: String,
    pub price: String,
    pub notes: String,
    pub category: ItemCategory,
}

impl ItemForm {
    /// Pre-fill the dialog for editing an existing item
    pub fn from_item(item: &ShoppingItem) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.quantity.to_string(),
            price: item.price.to_string(),
            notes: item.notes.clone(),
            category: item.category,
        }
    }

    /// Build the item to save.
    ///
    /// Returns `None` when the trimmed name is empty. When `existing` is given
    /// its id, bought flag and timestamp are kept so the result is an update.
    /// The result can still be invalid (e.g. quantity "-2"); the session
    /// refuses those before they reach the store.
    pub fn into_item(self, existing: Option<&ShoppingItem>) -> Option<ShoppingItem> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }

        let mut item = match existing {
            Some(existing) => existing.clone(),
            None => ShoppingItem::new(name, 1),
        };
        item.name = name.to_string();
        item.quantity = parse_quantity(&self.quantity);
        item.price = parse_price(&self.price);
        item.notes = self.notes.trim().to_string();
        item.category = self.category;
        Some(item)
    }
}

/// Integer quantity, 1 when the text is not a number
pub fn parse_quantity(text: &str) -> i32 {
    text.trim().parse().unwrap_or(1)
}

/// Unit price, 0.0 when the text is not a number
pub fn parse_price(text: &str) -> f64 {
    text.trim().parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_fallbacks() {
        assert_eq!(parse_quantity("3"), 3);
        assert_eq!(parse_quantity(" 4 "), 4);
        assert_eq!(parse_quantity(""), 1);
        assert_eq!(parse_quantity("two"), 1);
        assert_eq!(parse_quantity("2.5"), 1);

        assert_eq!(parse_price("1.25"), 1.25);
        assert_eq!(parse_price(""), 0.0);
        assert_eq!(parse_price("cheap"), 0.0);
    }

    #[test]
    fn test_new_item_from_form() {
        let form = ItemForm {
            name: "  Milk ".to_string(),
            quantity: "2".to_string(),
            price: "abc".to_string(),
            notes: " semi-skimmed ".to_string(),
            category: ItemCategory::Drinks,
        };

        let item = form.into_item(None).unwrap();
        assert_eq!(item.id, 0);
        assert_eq!(item.name, "Milk");
        assert_eq!(item.quantity, 2);
        assert_eq!(item.price, 0.0);
        assert_eq!(item.notes, "semi-skimmed");
        assert_eq!(item.category, ItemCategory::Drinks);
    }

    #[test]
    fn test_blank_name_yields_nothing() {
        let form = ItemForm {
            name: "   ".to_string(),
            ..ItemForm::default()
        };
        assert!(form.into_item(None).is_none());
    }

    #[test]
    fn test_edit_keeps_identity() {
        let mut existing = ShoppingItem::new("Bread", 1).with_timestamp(42);
        existing.id = 7;
        existing.is_bought = true;

        let mut form = ItemForm::from_item(&existing);
        assert_eq!(form.quantity, "1");
        form.quantity = "3".to_string();
        form.price = "2.5".to_string();

        let edited = form.into_item(Some(&existing)).unwrap();
        assert_eq!(edited.id, 7);
        assert_eq!(edited.timestamp, 42);
        assert!(edited.is_bought);
        assert_eq!(edited.quantity, 3);
        assert_eq!(edited.price, 2.5);
    }

    #[test]
    fn test_negative_quantity_is_kept_for_validation() {
        let form = ItemForm {
            name: "Eggs".to_string(),
            quantity: "-2".to_string(),
            ..ItemForm::default()
        };
        let item = form.into_item(None).unwrap();
        assert_eq!(item.quantity, -2);
        assert!(!item.is_valid());
    }
}
