//! Segment visualization using Plotters

use crate::data::NormalizedFeatures;
use crate::pipeline::SegmentationReport;
use plotters::prelude::*;

/// Color palette indexed by segment rank (best first).
const SEGMENT_COLORS: [RGBColor; 5] = [RED, BLUE, GREEN, MAGENTA, CYAN];

fn rank_color(rank: usize) -> &'static RGBColor {
    SEGMENT_COLORS
        .get(rank.saturating_sub(1))
        .unwrap_or(&BLACK)
}

/// Scatter plot of normalized frequency vs monetary, colored by segment.
///
/// Point order in `features` must match the report's assignment order, which
/// both inherit from the aggregation order of the customer collection.
pub fn create_segment_scatter(
    features: &NormalizedFeatures,
    report: &SegmentationReport,
    output_path: &str,
) -> crate::Result<()> {
    let matrix = &features.matrix;

    let mut rank_of_cluster = vec![0usize; report.optimal_k];
    for cluster in &report.clusters {
        rank_of_cluster[cluster.cluster_id] = cluster.rank;
    }

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Customer Segments: Frequency vs Monetary (Normalized)",
            ("sans-serif", 30),
        )
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.05f64..1.05f64, -0.05f64..1.05f64)?;

    chart
        .configure_mesh()
        .x_desc("Frequency (Normalized)")
        .y_desc("Monetary (Normalized)")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (row, assignment) in report.assignments.iter().enumerate() {
        let frequency = matrix[[row, 1]];
        let monetary = matrix[[row, 2]];
        let color = rank_color(rank_of_cluster[assignment.cluster_id]);
        chart.draw_series(std::iter::once(Circle::new(
            (frequency, monetary),
            4,
            color.filled(),
        )))?;
    }

    // One labeled series per ranked segment so the legend reads VIP-first.
    for cluster in &report.clusters {
        let color = rank_color(cluster.rank);
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(-1.0, -1.0), (-1.0, -1.0)],
                color.filled(),
            )))?
            .label(format!("{} ({} customers)", cluster.label, cluster.size))
            .legend(move |(x, y)| Rectangle::new([(x, y), (x + 10, y + 10)], color.filled()));
    }

    chart.configure_series_labels().draw()?;
    root.present()?;
    tracing::info!(output_path, "segment scatter saved");

    Ok(())
}

/// Bar chart of segment sizes, ordered by rank.
pub fn create_segment_size_chart(
    report: &SegmentationReport,
    output_path: &str,
) -> crate::Result<()> {
    let max_size = report
        .clusters
        .iter()
        .map(|c| c.size)
        .max()
        .unwrap_or(1) as f64;

    let root = BitMapBackend::new(output_path, (600, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Segment Sizes", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..(report.clusters.len() as f64), 0f64..(max_size * 1.1))?;

    chart
        .configure_mesh()
        .x_desc("Segment Rank")
        .y_desc("Number of Customers")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for cluster in &report.clusters {
        let x = (cluster.rank - 1) as f64;
        let color = rank_color(cluster.rank);
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x + 0.1, 0.0), (x + 0.9, cluster.size as f64)],
            color.filled(),
        )))?;
    }

    root.present()?;
    tracing::info!(output_path, "segment size chart saved");

    Ok(())
}

/// Emit the scatter plot and the size chart next to each other.
pub fn render_report_charts(
    features: &NormalizedFeatures,
    report: &SegmentationReport,
    base_output_path: &str,
) -> crate::Result<()> {
    create_segment_scatter(features, report, base_output_path)?;
    let size_chart_path = base_output_path.replace(".png", "_sizes.png");
    create_segment_size_chart(report, &size_chart_path)?;
    Ok(())
}
