//! Sequential order-number generation.
//!
//! Numbers are derived from the current row count inside the caller's
//! transaction, so a failed creation never burns a number.

use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait};

use crate::entities::{invoice, production_order, purchase_order, sales_order};
use crate::errors::ServiceError;

pub fn format_number(prefix: &str, sequence: u64, width: usize) -> String {
    format!("{}-{:0width$}", prefix, sequence, width = width)
}

pub async fn next_sales_order_number<C: ConnectionTrait>(
    conn: &C,
) -> Result<String, ServiceError> {
    let count = sales_order::Entity::find().count(conn).await?;
    Ok(format_number("OV", count + 1, 4))
}

/// Base for a batch of production-order numbers: the caller adds the
/// in-batch index so one transaction can number several orders.
pub async fn production_order_number_base<C: ConnectionTrait>(
    conn: &C,
) -> Result<u64, ServiceError> {
    let count = production_order::Entity::find().count(conn).await?;
    Ok(count)
}

pub async fn next_purchase_order_number<C: ConnectionTrait>(
    conn: &C,
) -> Result<String, ServiceError> {
    let count = purchase_order::Entity::find().count(conn).await?;
    Ok(format_number("OC", count + 1, 4))
}

pub async fn next_invoice_number<C: ConnectionTrait>(conn: &C) -> Result<String, ServiceError> {
    let count = invoice::Entity::find().count(conn).await?;
    Ok(format_number("FC", count + 1, 4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_fixed_width() {
        assert_eq!(format_number("OV", 1, 4), "OV-0001");
        assert_eq!(format_number("OP", 1, 5), "OP-00001");
        assert_eq!(format_number("OC", 123, 4), "OC-0123");
        assert_eq!(format_number("OV", 12345, 4), "OV-12345");
    }
}
