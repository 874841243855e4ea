use anyhow::{bail, Result};
use clap::Args;
use textplots::{Chart, Plot, Shape};

use crate::model::PriceHistory;
use crate::service::QuoteService;

#[derive(Debug, Args, Clone)]
pub struct ChartArgs {
    /// Ticker to plot (e.g. PETR4)
    pub ticker: String,

    /// Chart width in characters
    #[arg(long, default_value_t = 120)]
    pub width: u32,

    /// Chart height in characters
    #[arg(long, default_value_t = 30)]
    pub height: u32,
}

pub async fn run(service: &QuoteService, args: ChartArgs) -> Result<()> {
    let history = service.history(&args.ticker).await?;
    if history.history.len() < 2 {
        bail!(
            "not enough data points to render a chart for {}",
            history.ticker
        );
    }

    render_chart(&history, args.width, args.height);
    Ok(())
}

/// Day index on the x axis, close on the y axis.
fn samples(history: &PriceHistory) -> Vec<(f32, f32)> {
    history
        .history
        .values()
        .enumerate()
        .map(|(idx, price)| (idx as f32, *price as f32))
        .collect()
}

fn render_chart(history: &PriceHistory, width: u32, height: u32) {
    println!(
        "{} closes over the last {} ({} sessions)",
        history.ticker,
        history.period,
        history.history.len()
    );
    for (date, price) in &history.history {
        println!("  {date}  {price:>10.2}");
    }

    let min_price = history
        .history
        .values()
        .copied()
        .fold(f64::INFINITY, f64::min);
    let max_price = history
        .history
        .values()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    println!("Price range: {:.2} → {:.2}", min_price, max_price);

    let points = samples(history);
    let max_x = (points.len().saturating_sub(1) as f32).max(1.0);

    Chart::new(width.max(40), height.max(10), 0.0, max_x)
        .lineplot(&Shape::Lines(&points))
        .display();
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Period;
    use indexmap::IndexMap;

    #[test]
    fn samples_follow_history_order() {
        let mut history = IndexMap::new();
        history.insert("2024-03-04".to_string(), 37.42);
        history.insert("2024-03-05".to_string(), 37.1);
        let history = PriceHistory {
            ticker: "PETR4.SA".to_string(),
            period: Period::FiveDays,
            history,
        };

        let points = samples(&history);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].0, 0.0);
        assert_eq!(points[1].0, 1.0);
        assert!((points[0].1 - 37.42).abs() < 1e-4);
    }
}
