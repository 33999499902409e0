use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Box-Muller transform for a normal sample.
fn gauss(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

struct Rows {
    project: Vec<String>,
    region: Vec<String>,
    month: Vec<i64>,
    revenue: Vec<Option<f64>>,
    cost: Vec<f64>,
}

/// Monthly figures per project: linear, quadratic and saturating trends with
/// noise, and a few blank revenue cells.
fn generate(rng: &mut StdRng) -> Rows {
    let projects: [(&str, fn(f64) -> f64); 3] = [
        ("Alpha", |t: f64| 100.0 + 12.0 * t),
        ("Beta", |t: f64| 80.0 + 0.8 * t * t),
        ("Gamma", |t: f64| 300.0 * (1.0 - (-t / 8.0).exp())),
    ];
    let regions = ["North", "South"];

    let mut rows = Rows {
        project: Vec::new(),
        region: Vec::new(),
        month: Vec::new(),
        revenue: Vec::new(),
        cost: Vec::new(),
    };

    for (name, trend) in projects {
        for region in regions {
            for month in 1..=24_i64 {
                let base = trend(month as f64);
                let revenue = gauss(rng, base, base * 0.05);
                rows.project.push(name.to_string());
                rows.region.push(region.to_string());
                rows.month.push(month);
                rows.revenue.push((rng.gen::<f64>() > 0.03).then_some(revenue));
                rows.cost.push(gauss(rng, base * 0.6, 5.0));
            }
        }
    }
    rows
}

fn write_parquet(rows: &Rows, path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Project", DataType::Utf8, false),
        Field::new("Region", DataType::Utf8, false),
        Field::new("Month", DataType::Int64, false),
        Field::new("Revenue", DataType::Float64, true),
        Field::new("Cost", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(rows.project.clone())),
            Arc::new(StringArray::from(rows.region.clone())),
            Arc::new(Int64Array::from(rows.month.clone())),
            Arc::new(Float64Array::from(rows.revenue.clone())),
            Arc::new(Float64Array::from(rows.cost.clone())),
        ],
    )
    .context("Failed to create RecordBatch")?;

    let file = std::fs::File::create(path).context("Failed to create output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("Failed to create writer")?;
    writer.write(&batch).context("Failed to write batch")?;
    writer.close().context("Failed to close writer")?;
    Ok(())
}

fn write_csv(rows: &Rows, path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("Failed to create CSV file")?;
    writer.write_record(["Project", "Region", "Month", "Revenue", "Cost"])?;
    for i in 0..rows.month.len() {
        let revenue = rows.revenue[i].map(|v| format!("{v:.2}")).unwrap_or_default();
        writer.write_record([
            rows.project[i].as_str(),
            rows.region[i].as_str(),
            rows.month[i].to_string().as_str(),
            revenue.as_str(),
            format!("{:.2}", rows.cost[i]).as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let rows = generate(&mut rng);

    write_parquet(&rows, "sample_data.parquet")?;
    write_csv(&rows, "sample_data.csv")?;

    println!(
        "Wrote {} rows to sample_data.parquet and sample_data.csv",
        rows.month.len()
    );
    Ok(())
}
