use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lifetrack::metrics::{AverageMetric, CardioMetrics, RateMetric, StrengthMetric};
use lifetrack::{Config, Dataset, GoalEngineContext, TimeWindow};

#[derive(Parser)]
#[command(name = "lifetrack", about = "Habit metrics and goal projections")]
struct Cli {
    /// Dataset export (default: config data_path, else ~/.lifetrack/data.json)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Config file (default: ~/.lifetrack/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Evaluate as of this date instead of the current time
    #[arg(long, value_name = "DATE")]
    now: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dashboard metrics for a time window
    Metrics {
        /// Window: 7d, 30d, 90d, 365d or all (default: config default_window)
        #[arg(long)]
        window: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Monthly trend of one metric over the whole log
    Trend {
        /// Metric name (e.g. meditation, mood, strength_total)
        metric: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Projections for every goal
    Goals {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Expected vs actual path for one goal
    Trajectory {
        /// Goal key
        goal_key: String,
        /// Health measurement field to track (default: the goal key)
        #[arg(long)]
        field: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let mut config = Config::load_from(&config_path)?;

    match cli.command {
        Commands::Config { action } => {
            handle_config(&mut config, &config_path, action)?;
        }
        Commands::Metrics { window, json } => {
            let ctx = load_context(cli.data, cli.now.as_deref(), &config)?;
            let window = match window {
                Some(w) => TimeWindow::parse(&w)?,
                None => config.window()?,
            };
            handle_metrics(&ctx, window, json)?;
        }
        Commands::Trend { metric, json } => {
            let ctx = load_context(cli.data, cli.now.as_deref(), &config)?;
            handle_trend(&ctx, &metric, json)?;
        }
        Commands::Goals { json } => {
            let ctx = load_context(cli.data, cli.now.as_deref(), &config)?;
            handle_goals(&ctx, json)?;
        }
        Commands::Trajectory {
            goal_key,
            field,
            json,
        } => {
            let ctx = load_context(cli.data, cli.now.as_deref(), &config)?;
            let t = ctx.trajectory(&goal_key, field.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&t)?);
            } else {
                print_trajectory(&goal_key, &t);
            }
        }
    }

    Ok(())
}

fn load_context(
    data: Option<PathBuf>,
    now: Option<&str>,
    config: &Config,
) -> anyhow::Result<GoalEngineContext> {
    let now = match now {
        Some(s) => lifetrack::date_util::parse_instant(s)
            .ok_or_else(|| lifetrack::Error::InvalidDate(s.to_string()))?,
        None => chrono::Utc::now(),
    };
    let data_path = match data {
        Some(path) => path,
        None => config.data_path()?,
    };
    let dataset = Dataset::load(&data_path)
        .with_context(|| format!("loading dataset {}", data_path.display()))?;
    Ok(GoalEngineContext::from_dataset(dataset, config.targets.clone(), now))
}

fn handle_config(
    config: &mut Config,
    path: &std::path::Path,
    action: ConfigAction,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match config.get(&key)? {
            Some(v) => println!("{key} = {v}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            config.save_to(path)?;
            println!("Config updated.");
        }
        ConfigAction::List => {
            for (k, v) in config.list()? {
                println!("{k} = {v}");
            }
        }
    }
    Ok(())
}

fn handle_metrics(ctx: &GoalEngineContext, window: TimeWindow, json: bool) -> anyhow::Result<()> {
    let m = ctx.goal_metrics(window);
    if json {
        println!("{}", serde_json::to_string_pretty(&m)?);
        return Ok(());
    }

    println!(
        "Metrics: {} ({} days, {} entries)",
        m.window, m.days_in_period, m.entries_count
    );
    println!("  Social:");
    print_rate("Family", &m.social.family);
    print_rate("Friends", &m.social.friends);
    print_rate("Events", &m.social.events);
    print_rate("New contacts", &m.social.new_contacts);
    println!("  Wellbeing:");
    print_rate("Meditation", &m.wellbeing.meditation);
    print_rate("Gratitude", &m.wellbeing.gratitude);
    print_rate("Journal", &m.wellbeing.journal);
    print_average("Mood", &m.wellbeing.mood);
    print_average("Energy", &m.wellbeing.energy);
    println!("  Health:");
    print_strength(&m.health.strength);
    print_cardio(&m.health.cardio);
    print_average("Sleep", &m.health.sleep);
    print_rate("Alcohol-free", &m.health.alcohol_free);
    println!("  Productivity:");
    print_rate("Deep work", &m.productivity.deep_work);
    print_rate("Reading", &m.productivity.reading);
    print_rate("Learning", &m.productivity.learning);
    Ok(())
}

fn handle_trend(ctx: &GoalEngineContext, metric: &str, json: bool) -> anyhow::Result<()> {
    if lifetrack::metrics::formula::formula_for(metric).is_none() {
        log::warn!("Unknown metric '{metric}'; values will be 0");
    }
    let series = ctx.monthly_trend(metric);
    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
        return Ok(());
    }

    println!("Trend: {metric}");
    if !lifetrack::history::has_sufficient_history(&series) {
        println!("  Not enough history for a trend");
    }
    for p in &series {
        println!("  {}  {:>8.1}  ({} entries)", p.period, p.value, p.count);
    }
    Ok(())
}

fn handle_goals(ctx: &GoalEngineContext, json: bool) -> anyhow::Result<()> {
    let projections = ctx.project_goals();
    if json {
        println!("{}", serde_json::to_string_pretty(&projections)?);
        return Ok(());
    }
    if projections.is_empty() {
        println!("No goals configured.");
        return Ok(());
    }

    for gp in &projections {
        let p = &gp.projection;
        let status = if p.is_on_track { "on track" } else { "behind" };
        println!("{} [{}]: {status}", gp.goal.key, gp.goal.category);
        println!(
            "    Progress:  {} / {} ({:.1}%)",
            p.current_value, p.target_value, p.progress_percentage
        );
        if p.is_rolling {
            println!("    Deadline:  rolling");
            continue;
        }
        if let Some(days) = p.days_until_target {
            println!("    Deadline:  {days} days");
        }
        println!("    Rate:      {:.2}/day", p.rate_of_progress);
        match p.projected_completion_date {
            Some(date) => println!("    Projected: {}", date.format("%Y-%m-%d")),
            None => println!("    Projected: n/a"),
        }
    }
    Ok(())
}

fn print_rate(label: &str, r: &RateMetric) {
    println!(
        "    {label:<13} {:>3} days / {:.1} target ({:.1}%), rate {:.1}%",
        r.days_count, r.target, r.progress, r.rate
    );
}

fn print_average(label: &str, a: &AverageMetric) {
    if a.samples == 0 {
        println!("    {label:<13} no data");
        return;
    }
    println!(
        "    {label:<13} avg {:.1} / {:.1} ({:.1}%), {} samples",
        a.average, a.target, a.progress, a.samples
    );
}

fn print_strength(s: &StrengthMetric) {
    println!(
        "    {:<13} {:>3} days / {:.1} target ({:.1}%), latest total {}",
        "Strength", s.days_count, s.target, s.progress, s.latest_total
    );
}

fn print_cardio(c: &CardioMetrics) {
    println!(
        "    {:<13} {:>3} days / {:.1} target ({:.1}%), source {:?}",
        "Cardio", c.days_count, c.target, c.progress, c.source
    );
    println!(
        "    {:<13} {:.1} / {:.1} ({:.1}%)",
        "Weekly load", c.weekly_load, c.weekly_load_target, c.weekly_load_progress
    );
    if let Some(hr) = c.average_heart_rate {
        println!("    {:<13} {hr:.0} bpm", "Avg HR");
    }
    if let Some(cap) = c.latest_capacity {
        println!("    {:<13} {cap:.1}", "Capacity");
    }
}

fn print_trajectory(goal_key: &str, t: &lifetrack::Trajectory) {
    let status = if t.is_on_track { "on track" } else { "behind" };
    println!("Trajectory: {goal_key} ({status})");
    println!("  Start:     {:.1}", t.initial_value);
    println!(
        "  Today:     {:.1} (expected {:.1}, {:.0}% of window)",
        t.current_value,
        t.expected_today,
        t.time_fraction * 100.0
    );
    println!(
        "  Target:    {:.1} (projected {:.1})",
        t.target_value, t.projected_final
    );
    println!(
        "  Window:    {:.0} of {:.0} days",
        t.elapsed_days, t.total_days
    );
}
