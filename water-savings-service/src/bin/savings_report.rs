use anyhow::{bail, Result};
use water_savings_service::{
    build_pipeline,
    config::AppConfig,
    observability,
    pipeline::{SavingsRequest, WaterSavingsParams},
};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 6 {
        bail!("usage: savings_report <latitude> <longitude> <start_date> <end_date> <area_sqft>");
    }

    let params = WaterSavingsParams {
        latitude: Some(args[1].clone()),
        longitude: Some(args[2].clone()),
        start_date: Some(args[3].clone()),
        end_date: Some(args[4].clone()),
        area_sq_ft: Some(args[5].clone()),
    };
    let request = SavingsRequest::try_from(params)?;

    // Reuses the server's upstream, retry and cache settings.
    let cfg = AppConfig::load()?;
    let pipeline = build_pipeline(&cfg)?;

    let report = pipeline.run(&request).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
