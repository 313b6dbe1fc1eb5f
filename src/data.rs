//! Domain records, RFM metric aggregation and feature normalization

use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A customer as exposed by the surrounding system; only the stable
/// identifier matters to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
}

/// Fulfillment state of an order. Only delivered orders count toward RFM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Shipped,
    Delivered,
    Cancelled,
}

/// A raw order record tied to a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub customer_id: String,
    pub total: f64,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
}

/// Per-customer Recency/Frequency/Monetary metrics.
///
/// Customers with zero delivered orders are never recorded, so
/// `frequency >= 1` always holds; recency and monetary are clamped to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfmRecord {
    pub customer_id: String,
    /// Whole days since the newest delivered order.
    pub recency: u32,
    /// Count of delivered orders.
    pub frequency: u32,
    /// Total delivered-order value.
    pub monetary: f64,
}

impl RfmRecord {
    /// The record as a 3-vector in R/F/M axis order.
    pub fn as_features(&self) -> [f64; 3] {
        [self.recency as f64, self.frequency as f64, self.monetary]
    }
}

/// Derive one `RfmRecord` per customer with at least one delivered order.
///
/// `now` is the reference instant for recency; orders newer than `now`
/// clamp recency to 0 rather than going negative. The output preserves the
/// iteration order of `customers`.
pub fn compute_rfm(customers: &[Customer], orders: &[Order], now: DateTime<Utc>) -> Vec<RfmRecord> {
    let mut by_customer: HashMap<&str, Vec<&Order>> = HashMap::new();
    for order in orders.iter().filter(|o| o.status == OrderStatus::Delivered) {
        by_customer
            .entry(order.customer_id.as_str())
            .or_default()
            .push(order);
    }

    let mut records = Vec::new();
    for customer in customers {
        let Some(own_orders) = by_customer.get(customer.id.as_str()) else {
            continue;
        };
        let Some(newest) = own_orders.iter().map(|o| o.created_at).max() else {
            continue;
        };
        let recency = (now - newest).num_days().max(0) as u32;
        let monetary = own_orders.iter().map(|o| o.total).sum::<f64>().max(0.0);
        records.push(RfmRecord {
            customer_id: customer.id.clone(),
            recency,
            frequency: own_orders.len() as u32,
            monetary,
        });
    }
    records
}

/// Per-axis min-max scaler fitted over the full record set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxScaler {
    mins: [f64; 3],
    maxs: [f64; 3],
}

impl MinMaxScaler {
    /// Fit axis bounds over the record set.
    pub fn fit(records: &[RfmRecord]) -> Self {
        let mut mins = [f64::INFINITY; 3];
        let mut maxs = [f64::NEG_INFINITY; 3];
        for record in records {
            for (axis, value) in record.as_features().into_iter().enumerate() {
                mins[axis] = mins[axis].min(value);
                maxs[axis] = maxs[axis].max(value);
            }
        }
        Self { mins, maxs }
    }

    /// Axes where every record holds the same value. Such an axis maps to 0
    /// for all records and contributes nothing to cluster distances.
    pub fn degenerate_axes(&self) -> [bool; 3] {
        [
            self.maxs[0] == self.mins[0],
            self.maxs[1] == self.mins[1],
            self.maxs[2] == self.mins[2],
        ]
    }

    /// Map records into `[0, 1]` per axis; a degenerate axis maps to 0.
    pub fn transform(&self, records: &[RfmRecord]) -> Array2<f64> {
        let mut features = Array2::zeros((records.len(), 3));
        for (row, record) in records.iter().enumerate() {
            for (axis, value) in record.as_features().into_iter().enumerate() {
                let span = self.maxs[axis] - self.mins[axis];
                features[[row, axis]] = if span == 0.0 {
                    0.0
                } else {
                    (value - self.mins[axis]) / span
                };
            }
        }
        features
    }
}

/// Normalized feature matrix together with its data-quality flags.
#[derive(Debug, Clone)]
pub struct NormalizedFeatures {
    /// `(n_customers, 3)` matrix with every value in `[0, 1]`.
    pub matrix: Array2<f64>,
    /// Per-axis zero-variance flags in R/F/M order.
    pub degenerate_axes: [bool; 3],
}

/// Normalize a record set for clustering. Recomputed fresh per population;
/// nothing is retained between calls.
pub fn normalize(records: &[RfmRecord]) -> NormalizedFeatures {
    let scaler = MinMaxScaler::fit(records);
    let degenerate_axes = scaler.degenerate_axes();
    if degenerate_axes.iter().any(|&d| d) {
        tracing::warn!(
            recency = degenerate_axes[0],
            frequency = degenerate_axes[1],
            monetary = degenerate_axes[2],
            "zero-variance axis detected; it will not contribute to clustering"
        );
    }
    NormalizedFeatures {
        matrix: scaler.transform(records),
        degenerate_axes,
    }
}

/// Five-number summary plus mean for one RFM axis, in original scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSummary {
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
    pub mean: f64,
}

impl AxisSummary {
    fn from_values(mut values: Vec<f64>) -> Self {
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Self {
            min: values[0],
            p25: percentile(&values, 0.25),
            median: percentile(&values, 0.5),
            p75: percentile(&values, 0.75),
            max: values[values.len() - 1],
            mean,
        }
    }
}

/// Descriptive statistics of the input population, per axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub customers: usize,
    pub recency: AxisSummary,
    pub frequency: AxisSummary,
    pub monetary: AxisSummary,
}

impl PopulationStats {
    /// Summarize a non-empty record set.
    pub fn from_records(records: &[RfmRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        Some(Self {
            customers: records.len(),
            recency: AxisSummary::from_values(records.iter().map(|r| r.recency as f64).collect()),
            frequency: AxisSummary::from_values(
                records.iter().map(|r| r.frequency as f64).collect(),
            ),
            monetary: AxisSummary::from_values(records.iter().map(|r| r.monetary).collect()),
        })
    }
}

/// Linear-interpolated percentile over sorted values.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = position - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}
