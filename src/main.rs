use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use sales_kpi_dashboard::aggregate::AggregationOptions;
use sales_kpi_dashboard::models::TimeOfDay;
use sales_kpi_dashboard::report::{self, describe_filter};
use sales_kpi_dashboard::{load_csv, Dashboard, FilterPredicate};

#[derive(Parser)]
#[command(name = "sales-kpi")]
#[command(about = "Sales KPIs, chart series and insights from a transaction CSV", long_about = None)]
struct Cli {
    /// Sales CSV to analyse (falls back to SALES_DATA_PATH)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Region id to include (repeatable)
    #[arg(long = "region")]
    regions: Vec<String>,
    /// Time of day to include: morning, afternoon, evening or night (repeatable)
    #[arg(long = "time-of-day")]
    times_of_day: Vec<TimeOfDay>,
    #[arg(long)]
    year: Option<i32>,
}

impl FilterArgs {
    fn predicate(&self) -> FilterPredicate {
        FilterPredicate::all()
            .with_regions(self.regions.iter().cloned())
            .with_times_of_day(self.times_of_day.iter().copied())
            .with_year(self.year)
    }
}

#[derive(Args, Debug)]
struct RankingArgs {
    #[arg(long, default_value_t = 5)]
    top_products: usize,
    #[arg(long, default_value_t = 10)]
    top_reps: usize,
}

impl From<&RankingArgs> for AggregationOptions {
    fn from(args: &RankingArgs) -> Self {
        AggregationOptions {
            top_products: args.top_products,
            top_reps: args.top_reps,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print KPIs, insights and recommendations
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        ranking: RankingArgs,
        #[arg(long, default_value = "sales-report.md")]
        out: PathBuf,
    },
    /// Export metrics and every chart series as JSON
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        ranking: RankingArgs,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the regions and years available for filtering
    Options,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let data_path = match cli.data {
        Some(path) => path,
        None => std::env::var("SALES_DATA_PATH")
            .map(PathBuf::from)
            .context("pass --data or set SALES_DATA_PATH to a sales CSV")?,
    };
    let dataset = load_csv(&data_path)
        .with_context(|| format!("failed to load {}", data_path.display()))?;

    match cli.command {
        Commands::Summary { filter } => {
            let dashboard = Dashboard::new(dataset, AggregationOptions::default());
            let predicate = filter.predicate();
            let output = dashboard.recompute(&predicate);

            println!(
                "Sales for {} ({} orders):",
                describe_filter(&predicate),
                output.record_count
            );
            println!("- Total sales: {}", output.kpis.total_sales);
            println!("- Quantity sold: {}", output.kpis.total_quantity);
            println!("- Total profit: {}", output.kpis.total_profit);
            println!("- Avg order size: {}", output.kpis.avg_order_size);
            println!("- MoM growth: {}", output.kpis.mom_growth);
            println!("- YoY growth: {}", output.kpis.yoy_growth);
            println!("- Return rate: {}", output.kpis.return_rate);

            if output.insights.is_empty() {
                println!("No orders match this filter.");
                return Ok(());
            }

            println!("Key insights:");
            for insight in &output.insights {
                println!("- {insight}");
            }
            println!("Recommendations:");
            for recommendation in &output.recommendations {
                println!("- {recommendation}");
            }
        }
        Commands::Report {
            filter,
            ranking,
            out,
        } => {
            let dashboard = Dashboard::new(dataset, AggregationOptions::from(&ranking));
            let output = dashboard.recompute(&filter.predicate());
            std::fs::write(&out, report::build_report(&output))
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export {
            filter,
            ranking,
            out,
        } => {
            let dashboard = Dashboard::new(dataset, AggregationOptions::from(&ranking));
            let output = dashboard.recompute(&filter.predicate());
            let json = serde_json::to_string_pretty(&output)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Export written to {}.", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Options => {
            let dashboard = Dashboard::new(dataset, AggregationOptions::default());
            let options = dashboard.filter_options();
            println!("Regions: {}", options.regions.join(", "));
            let years: Vec<String> = options.years.iter().map(i32::to_string).collect();
            println!("Years: {}", years.join(", "));
            let times: Vec<&str> = options.times_of_day.iter().map(|t| t.as_str()).collect();
            println!("Times of day: {}", times.join(", "));
        }
    }

    Ok(())
}
