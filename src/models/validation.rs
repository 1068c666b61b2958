use rust_decimal::Decimal;

use super::{Order, OrderItem, Product, ValidationError, ValidationErrors, ValidationResult};

/// Trait for validating input models
///
/// Implementations report every failing field, not just the first one.
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

/// Validation constants
pub const MAX_PRODUCT_NAME_LENGTH: usize = 200;
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;
pub const MAX_GROUP_LENGTH: usize = 100;
pub const MIN_PRICE: Decimal = Decimal::ZERO;
pub const MAX_PRICE: Decimal = Decimal::from_parts(99999999, 0, 0, false, 2); // 999999.99
pub const MAX_ORDER_ITEMS: usize = 100;
pub const MIN_ITEM_QUANTITY: u32 = 1;
pub const MAX_ITEM_QUANTITY: u32 = 1000;

type FieldResult = Result<(), ValidationError>;

impl Validate for Product {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_product_name(&self.name));
        errors.check(validate_product_description(&self.description));
        errors.check(validate_amount("price", &self.price));
        errors.check(validate_product_group(&self.group));
        errors.into_result()
    }
}

impl Validate for Order {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = ValidationErrors::new();
        errors.check(validate_amount("total", &self.total));

        if self.items.len() > MAX_ORDER_ITEMS {
            errors.push(ValidationError::OutOfRange {
                field: "items".to_string(),
                min: "0".to_string(),
                max: MAX_ORDER_ITEMS.to_string(),
                value: self.items.len().to_string(),
            });
        }

        for (index, item) in self.items.iter().enumerate() {
            validate_order_item(index, item, &mut errors);
        }

        errors.into_result()
    }
}

/// Validate product name
pub fn validate_product_name(name: &str) -> FieldResult {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "name".to_string(),
        });
    }

    if trimmed.chars().count() > MAX_PRODUCT_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max_length: MAX_PRODUCT_NAME_LENGTH,
            actual_length: trimmed.chars().count(),
        });
    }

    if trimmed
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t')
    {
        return Err(ValidationError::InvalidValue {
            field: "name".to_string(),
            value: name.to_string(),
            reason: "Contains invalid control characters".to_string(),
        });
    }

    Ok(())
}

/// Validate product description
pub fn validate_product_description(description: &str) -> FieldResult {
    let trimmed = description.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "description".to_string(),
        });
    }

    if trimmed.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max_length: MAX_DESCRIPTION_LENGTH,
            actual_length: trimmed.chars().count(),
        });
    }

    Ok(())
}

/// Validate product group label
pub fn validate_product_group(group: &str) -> FieldResult {
    let trimmed = group.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::RequiredField {
            field: "group".to_string(),
        });
    }

    if trimmed.chars().count() > MAX_GROUP_LENGTH {
        return Err(ValidationError::TooLong {
            field: "group".to_string(),
            max_length: MAX_GROUP_LENGTH,
            actual_length: trimmed.chars().count(),
        });
    }

    Ok(())
}

/// Validate a monetary amount (price or order total)
pub fn validate_amount(field: &str, amount: &Decimal) -> FieldResult {
    if *amount < MIN_PRICE || *amount > MAX_PRICE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: MIN_PRICE.to_string(),
            max: MAX_PRICE.to_string(),
            value: amount.to_string(),
        });
    }

    if amount.scale() > 2 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: amount.to_string(),
            reason: "Amount cannot have more than 2 decimal places".to_string(),
        });
    }

    Ok(())
}

/// Validate an item quantity
pub fn validate_item_quantity(field: &str, quantity: u32) -> FieldResult {
    if !(MIN_ITEM_QUANTITY..=MAX_ITEM_QUANTITY).contains(&quantity) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: MIN_ITEM_QUANTITY.to_string(),
            max: MAX_ITEM_QUANTITY.to_string(),
            value: quantity.to_string(),
        });
    }

    Ok(())
}

fn validate_order_item(index: usize, item: &OrderItem, errors: &mut ValidationErrors) {
    if item.product_id == 0 {
        errors.push(ValidationError::InvalidValue {
            field: format!("items[{}].product_id", index),
            value: item.product_id.to_string(),
            reason: "Product id must be positive".to_string(),
        });
    }

    errors.check(validate_item_quantity(
        &format!("items[{}].quantity", index),
        item.quantity,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;
    use rust_decimal_macros::dec;

    fn valid_product() -> Product {
        Product {
            id: None,
            name: "Desk Lamp".to_string(),
            price: dec!(39.90),
            description: "Adjustable LED desk lamp".to_string(),
            group: "lighting".to_string(),
        }
    }

    fn valid_order() -> Order {
        Order {
            id: None,
            status: OrderStatus::Pending,
            total: dec!(79.80),
            created_at: None,
            items: vec![OrderItem::new(1, 2)],
        }
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Desk Lamp").is_ok());

        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"a".repeat(MAX_PRODUCT_NAME_LENGTH + 1)).is_err());
        assert!(validate_product_name("Desk\x00Lamp").is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("price", &dec!(0.00)).is_ok());
        assert!(validate_amount("price", &dec!(12.99)).is_ok());
        assert!(validate_amount("price", &MAX_PRICE).is_ok());

        assert!(validate_amount("price", &dec!(-0.01)).is_err());
        assert!(validate_amount("price", &dec!(1000000.00)).is_err());
        assert!(validate_amount("price", &dec!(1.999)).is_err());
    }

    #[test]
    fn test_validate_item_quantity() {
        assert!(validate_item_quantity("quantity", 1).is_ok());
        assert!(validate_item_quantity("quantity", MAX_ITEM_QUANTITY).is_ok());

        assert!(validate_item_quantity("quantity", 0).is_err());
        assert!(validate_item_quantity("quantity", MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_product_validation_reports_every_field() {
        assert!(valid_product().validate().is_ok());

        let invalid = Product {
            name: "".to_string(),
            description: "".to_string(),
            price: dec!(-5),
            ..valid_product()
        };

        let errors = invalid.validate().unwrap_err();
        let fields: Vec<&str> = errors.errors().iter().map(|e| e.field()).collect();
        assert_eq!(fields, vec!["name", "description", "price"]);
    }

    #[test]
    fn test_order_validation() {
        assert!(valid_order().validate().is_ok());

        let empty = Order {
            items: vec![],
            ..valid_order()
        };
        assert!(empty.validate().is_ok());

        let invalid = Order {
            items: vec![OrderItem::new(0, 1), OrderItem::new(3, 0)],
            ..valid_order()
        };
        let errors = invalid.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.errors()[0].field(), "items[0].product_id");
        assert_eq!(errors.errors()[1].field(), "items[1].quantity");
    }

    #[test]
    fn test_order_too_many_items() {
        let order = Order {
            items: (1..=(MAX_ORDER_ITEMS as u64 + 1))
                .map(|id| OrderItem::new(id, 1))
                .collect(),
            ..valid_order()
        };

        let errors = order.validate().unwrap_err();
        assert_eq!(errors.errors()[0].field(), "items");
    }
}
