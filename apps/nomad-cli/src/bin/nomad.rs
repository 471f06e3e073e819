//! nomad - budget-aware travel recommendations from the command line.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nomad_core::allocation::BudgetAllocation;
use nomad_core::catalog::Catalog;
use nomad_core::config::{Config, EngineSettings};
use nomad_core::provider::JsonDirProvider;
use nomad_core::types::{Query, QueryRequest, RankedResult, ScoredCandidate, Selector};
use nomad_embed::encoder_from_settings;
use nomad_hybrid::{Recommendation, RecommendationStatus, Recommender, Response, SearchAll, TripPlan};

#[derive(Parser, Debug)]
#[command(name = "nomad", version, about = "Budget-aware travel recommendations")]
struct Cli {
    /// Directory holding flights.json, hotels.json, activities.json, restaurants.json
    #[arg(long, global = true, env = "NOMAD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank candidates of one category, or `all` for a cross-category search
    Recommend {
        category: Selector,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Text search across every category, no constraints
    Search {
        text: String,
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Split a trip budget and recommend for every category
    Plan {
        #[command(flatten)]
        query: QueryArgs,
    },
}

#[derive(Args, Debug)]
struct QueryArgs {
    #[arg(long)]
    budget: f64,
    #[arg(long)]
    text: Option<String>,
    /// Comma-separated preferred tags
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long, default_value_t = 1)]
    people: u32,
    /// Hotel tier to match: budget, mid-range, luxury or any
    #[arg(long)]
    tier: Option<String>,
}

impl QueryArgs {
    fn to_request(&self, selector: Option<Selector>) -> QueryRequest {
        QueryRequest {
            text: self.text.clone(),
            preferred_tags: self.tags.clone(),
            budget: Some(self.budget),
            location: self.location.clone(),
            people_count: Some(self.people),
            tier: self.tier.clone(),
            category: selector.map(|s| s.to_string()),
        }
    }

    fn to_query(&self) -> nomad_core::Result<Query> { Query::try_from(self.to_request(None)) }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::registry().with(env_filter).with(fmt::layer().with_writer(std::io::stderr)).init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = Config::load()?;
    let settings = config.engine()?;
    let base = std::env::current_dir()?;
    let data_dir = cli.data_dir.clone().unwrap_or_else(|| settings.data_path(&base));
    debug!(env = config.env_name(), data_dir = %data_dir.display(), "starting");

    let catalog = Arc::new(Catalog::new(JsonDirProvider::new(&data_dir)));
    let encoder = Arc::new(encoder_from_settings(&settings, &base));
    let recommender = Recommender::new(catalog, encoder, &settings);
    tokio::runtime::Runtime::new()?.block_on(dispatch(&recommender, &settings, cli))
}

async fn dispatch(recommender: &Recommender, settings: &EngineSettings, cli: &Cli) -> anyhow::Result<()> {
    recommender.warm_up().await?;
    match &cli.command {
        Command::Recommend { category, query } => match recommender.respond(query.to_request(Some(*category))).await? {
            Response::Category(out) => {
                if cli.json { print_json(&out) } else { print_recommendation(&out); Ok(()) }
            }
            Response::All(out) => {
                if cli.json { print_json(&out) } else { print_search(&out); Ok(()) }
            }
        },
        Command::Search { text, tags } => {
            let out = recommender.search_all(&Query::unbounded().text(text.as_str()).tags(tags)).await?;
            if cli.json { print_json(&out) } else { print_search(&out); Ok(()) }
        }
        Command::Plan { query } => {
            let query = query.to_query()?;
            let allocation = BudgetAllocation::split(query.budget, query.people_count, &settings.allocation)?;
            let plan = recommender.plan_trip(&query, &allocation).await?;
            if cli.json { print_json(&plan) } else { print_plan(&plan); Ok(()) }
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn label(c: &ScoredCandidate) -> &str {
    if c.item.name.is_empty() { &c.item.id } else { &c.item.name }
}

fn print_items(items: &[ScoredCandidate]) {
    for (i, c) in items.iter().enumerate() {
        println!(
            "  {}. {} [{}]  {}  price={:.2} effective={:.2}  score={:.4} (sim={:.4} tags={:.2})",
            i + 1,
            label(c),
            c.item.id,
            c.item.location,
            c.item.price,
            c.effective_price,
            c.combined_score,
            c.similarity,
            c.tag_overlap
        );
    }
}

fn print_ranked_footer(r: &RankedResult) {
    println!(
        "  {} of {} shown, {} skipped, {:?} scoring, spent {:.2} of {:.2} ({:.0}%)",
        r.len(),
        r.total_found,
        r.skipped,
        r.mode,
        r.budget.spent,
        r.budget.budget,
        r.budget.ratio * 100.0
    );
}

fn print_recommendation(r: &Recommendation) {
    println!("{}", r.category.plural());
    match r.status {
        RecommendationStatus::EmptyCatalog => println!("  no {} in the catalog", r.category.plural()),
        RecommendationStatus::NoneWithinConstraints => println!("  nothing within a budget of {:.2}", r.ranked.budget.budget),
        RecommendationStatus::Ranked => {
            print_items(&r.ranked.items);
            print_ranked_footer(&r.ranked);
        }
    }
    if let Some(fallback) = &r.fallback {
        println!("  closest matches ignoring the {}:", fallback.relaxed);
        print_items(&fallback.items);
    }
}

fn print_search(s: &SearchAll) {
    println!("{} results from {} candidates ({:?} scoring, {} skipped)", s.hits.len(), s.total_considered, s.mode, s.skipped);
    for (category, ranked) in &s.by_category {
        if ranked.is_empty() { continue; }
        println!("{}", category.plural());
        print_items(&ranked.items);
    }
}

fn print_plan(plan: &TripPlan) {
    let a = &plan.allocation;
    println!(
        "budget {:.2} for {} ({:.2} per person): flights {:.2}, hotels {:.2}, activities {:.2}, restaurants {:.2}, transport {:.2}",
        a.total, a.people, a.per_person, a.flight, a.hotel, a.activity, a.restaurant, a.transport
    );
    for recommendation in plan.recommendations.values() {
        print_recommendation(recommendation);
    }
    let s = &plan.summary;
    println!("spent {:.2} of {:.2} ({:.0}%)", s.spent, s.total_budget, s.utilization * 100.0);
}
