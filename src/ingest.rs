//! CSV ingest for the customer and order collaborators
//!
//! Stands in for the document-store reads of the surrounding system: both
//! collections are fetched once per analysis run, before the pipeline
//! starts. Any ingest failure aborts the run; the core never sees partial
//! data.

use crate::data::{Customer, Order, OrderStatus};
use anyhow::Context;
use chrono::{DateTime, Utc};
use polars::prelude::*;

/// Load the customer collection from a CSV with a `customer_id` column.
pub fn load_customers(path: &str) -> crate::Result<Vec<Customer>> {
    let df = LazyCsvReader::new(path)
        .finish()?
        .filter(col("customer_id").is_not_null())
        .select([col("customer_id")])
        .collect()?;

    let ids = df.column("customer_id")?.cast(&DataType::Utf8)?;
    let customers = ids
        .utf8()?
        .into_no_null_iter()
        .map(|id| Customer { id: id.to_string() })
        .collect();
    Ok(customers)
}

/// Load delivered orders from a CSV with `customer_id`, `total`,
/// `created_at` (RFC 3339) and `status` columns.
///
/// Rows without a customer or not in the delivered state are dropped at this
/// boundary, mirroring the eligibility filter the pipeline applies itself.
pub fn load_orders(path: &str) -> crate::Result<Vec<Order>> {
    let df = LazyCsvReader::new(path)
        .finish()?
        .filter(
            col("customer_id")
                .is_not_null()
                .and(col("status").eq(lit("delivered"))),
        )
        .select([col("customer_id"), col("total"), col("created_at")])
        .collect()?;

    let customer_ids = df.column("customer_id")?.cast(&DataType::Utf8)?;
    let totals = df.column("total")?.cast(&DataType::Float64)?;
    let created = df.column("created_at")?.cast(&DataType::Utf8)?;

    let mut orders = Vec::with_capacity(df.height());
    for ((customer_id, total), created_at) in customer_ids
        .utf8()?
        .into_no_null_iter()
        .zip(totals.f64()?.into_no_null_iter())
        .zip(created.utf8()?.into_no_null_iter())
    {
        let created_at = DateTime::parse_from_rfc3339(created_at)
            .with_context(|| format!("invalid created_at timestamp: {created_at}"))?
            .with_timezone(&Utc);
        orders.push(Order {
            customer_id: customer_id.to_string(),
            total,
            created_at,
            status: OrderStatus::Delivered,
        });
    }
    Ok(orders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[test]
    fn test_load_customers() {
        let file = write_csv(&[
            "customer_id,name",
            "cust-001,Alice",
            "cust-002,Bob",
        ]);

        let customers = load_customers(file.path().to_str().unwrap()).unwrap();
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[0].id, "cust-001");
        assert_eq!(customers[1].id, "cust-002");
    }

    #[test]
    fn test_load_orders_filters_undelivered() {
        let file = write_csv(&[
            "order_id,customer_id,total,created_at,status",
            "o1,cust-001,120.5,2024-05-01T10:00:00Z,delivered",
            "o2,cust-001,80.0,2024-05-10T09:30:00Z,pending",
            "o3,cust-002,45.0,2024-04-20T16:45:00Z,delivered",
            "o4,cust-002,99.0,2024-04-25T11:00:00Z,cancelled",
        ]);

        let orders = load_orders(file.path().to_str().unwrap()).unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.status == OrderStatus::Delivered));
        assert_eq!(orders[0].customer_id, "cust-001");
        assert_eq!(orders[0].total, 120.5);
        assert_eq!(orders[1].customer_id, "cust-002");
    }

    #[test]
    fn test_load_orders_rejects_bad_timestamp() {
        let file = write_csv(&[
            "order_id,customer_id,total,created_at,status",
            "o1,cust-001,10.0,not-a-date,delivered",
        ]);

        let result = load_orders(file.path().to_str().unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_orders_empty_after_filter() {
        let file = write_csv(&[
            "order_id,customer_id,total,created_at,status",
            "o1,cust-001,10.0,2024-05-01T10:00:00Z,pending",
        ]);

        let orders = load_orders(file.path().to_str().unwrap()).unwrap();
        assert!(orders.is_empty());
    }
}
