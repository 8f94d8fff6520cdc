use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use liftlog_core::insights::{muscle_group_breakdown_top, period_summary};
use liftlog_core::units::from_canonical;
use liftlog_core::*;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Strength training log with progression insights", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a set
    Log(LogArgs),

    /// List exercises with their target rep ranges
    Exercises,

    /// Set or clear an exercise's target rep range
    Target {
        /// Exercise id
        exercise: String,

        #[arg(long, requires = "max")]
        min: Option<i32>,

        #[arg(long, requires = "min")]
        max: Option<i32>,

        /// Remove the target
        #[arg(long, conflicts_with_all = ["min", "max"])]
        clear: bool,
    },

    /// Choose the effort scale (none, rpe or rir) an exercise records
    Effort {
        /// Exercise id
        exercise: String,

        /// none, rpe or rir
        mode: String,
    },

    /// Show per-day sessions for an exercise, most recent first
    Sessions {
        /// Exercise id
        exercise: String,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Classify progression for one exercise, or every exercise with history
    Progress {
        /// Exercise id
        exercise: Option<String>,
    },

    /// Most recent lifetime volume records
    Prs {
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Daily or weekly volume series
    Trend {
        /// Number of days, ending today
        #[arg(long, conflicts_with = "weeks")]
        days: Option<u32>,

        /// Number of calendar weeks, ending with the current week
        #[arg(long)]
        weeks: Option<u32>,
    },

    /// Volume share per muscle group
    Breakdown {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },

    /// Workouts, sets, volume and PRs over a period
    Summary {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Export all sets to CSV
    Export {
        /// Output file (defaults to sets.csv in the data directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct LogArgs {
    /// Exercise id (see `liftlog exercises`)
    #[arg(long)]
    exercise: String,

    #[arg(long)]
    weight: Option<f64>,

    #[arg(long)]
    reps: Option<i32>,

    /// kg or lbs (defaults to the exercise's unit)
    #[arg(long)]
    unit: Option<String>,

    #[arg(long, conflicts_with = "rir")]
    rpe: Option<u8>,

    #[arg(long)]
    rir: Option<u8>,

    /// Day the set belongs to (defaults to today)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Record the set as not completed
    #[arg(long)]
    incomplete: bool,

    /// Replace the exercise's sets for that day with this one
    #[arg(long)]
    replace: bool,
}

struct App {
    store: FileStore,
    ctx: AnalyticsContext,
    config: Config,
    data_dir: PathBuf,
    json: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    liftlog_core::logging::init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);

    let calendar = config.calendar.policy()?;
    let now = match cli.today {
        Some(day) => calendar.midday_of(day)?,
        None => Utc::now(),
    };

    let mut app = App {
        store: FileStore::open(&data_dir, calendar),
        ctx: AnalyticsContext::new(now, calendar),
        config,
        data_dir,
        json: cli.json,
    };

    match cli.command {
        Commands::Log(args) => cmd_log(&mut app, args),
        Commands::Exercises => cmd_exercises(&app),
        Commands::Target {
            exercise,
            min,
            max,
            clear,
        } => cmd_target(&app, &exercise, min, max, clear),
        Commands::Effort { exercise, mode } => cmd_effort(&app, &exercise, &mode),
        Commands::Sessions { exercise, limit } => cmd_sessions(&app, &exercise, limit),
        Commands::Progress { exercise } => cmd_progress(&app, exercise.as_deref()),
        Commands::Prs { limit } => cmd_prs(&app, limit),
        Commands::Trend { days, weeks } => cmd_trend(&app, days, weeks),
        Commands::Breakdown { days } => cmd_breakdown(&app, days),
        Commands::Summary { days } => cmd_summary(&app, days),
        Commands::Export { output } => cmd_export(&app, output),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn describe_set(set: &LoggedSet) -> String {
    let mut text = match (set.weight, set.reps) {
        (Some(weight), Some(reps)) => format!("{} {} x {}", weight, set.unit, reps),
        (Some(weight), None) => format!("{} {}", weight, set.unit),
        (None, Some(reps)) => format!("{} reps", reps),
        (None, None) => "no load".to_string(),
    };
    match set.effort {
        Some(Effort::Rpe(v)) => text.push_str(&format!(" @ RPE {}", v)),
        Some(Effort::Rir(v)) => text.push_str(&format!(" @ {} RIR", v)),
        None => {}
    }
    if !set.is_completed {
        text.push_str(" (not completed)");
    }
    text
}

fn cmd_log(app: &mut App, args: LogArgs) -> Result<()> {
    let library = app.store.library()?;
    let exercise = library.get(&args.exercise)?;
    let calendar = *app.store.calendar();

    let unit = args
        .unit
        .as_deref()
        .map(WeightUnit::from)
        .unwrap_or(exercise.unit);
    let (day, instant) = match args.date {
        Some(day) => (day, calendar.midday_of(day)?),
        None => (app.ctx.today(), app.ctx.now),
    };
    let order = if args.replace {
        1
    } else {
        app.store.log().next_order(&exercise.id, day, &calendar)?
    };

    let mut set = LoggedSet::new(exercise.id.clone(), order, args.weight, args.reps, unit, instant);
    if args.incomplete {
        set = set.incomplete();
    }
    if let Some(rpe) = args.rpe {
        set = set.with_effort(Effort::Rpe(rpe));
    } else if let Some(rir) = args.rir {
        set = set.with_effort(Effort::Rir(rir));
    }
    set.validate_for(exercise)?;

    if args.replace {
        let removed =
            app.store
                .log()
                .replace_day(&exercise.id, day, std::slice::from_ref(&set), &calendar)?;
        tracing::debug!("Superseded {} set(s)", removed);
    } else {
        app.store.log_mut().append(&set)?;
    }

    if app.json {
        return print_json(&set);
    }
    println!(
        "✓ Logged {} set {} on {}: {}",
        exercise.name,
        set.order,
        day,
        describe_set(&set)
    );
    Ok(())
}

fn cmd_exercises(app: &App) -> Result<()> {
    let exercises = app.store.fetch_exercises()?;
    if app.json {
        return print_json(&exercises);
    }

    for exercise in &exercises {
        let target = exercise
            .target_reps
            .map(|r| format!("{}-{} reps", r.min, r.max))
            .unwrap_or_else(|| "no target".to_string());
        println!(
            "{:<20} {:<26} {:<11} {:<12} {}",
            exercise.id,
            exercise.name,
            exercise.primary_category.to_string(),
            target,
            exercise.unit
        );
    }
    Ok(())
}

fn cmd_target(
    app: &App,
    exercise_id: &str,
    min: Option<i32>,
    max: Option<i32>,
    clear: bool,
) -> Result<()> {
    let target = match (min, max, clear) {
        (_, _, true) => None,
        (Some(min), Some(max), false) => Some(RepRange::new(min, max)?),
        _ => {
            return Err(Error::Validation(
                "Provide both --min and --max, or --clear".into(),
            ))
        }
    };

    let library = ExerciseLibrary::update(app.store.library_path(), |library| {
        library.set_target(exercise_id, target)
    })?;
    let exercise = library.get(exercise_id)?;

    if app.json {
        return print_json(exercise);
    }
    match target {
        Some(range) => println!(
            "✓ {} target set to {}-{} reps",
            exercise.name, range.min, range.max
        ),
        None => println!("✓ {} target cleared", exercise.name),
    }
    Ok(())
}

fn cmd_effort(app: &App, exercise_id: &str, mode: &str) -> Result<()> {
    let mode: EffortMode = mode.parse()?;
    let library = ExerciseLibrary::update(app.store.library_path(), |library| {
        library.set_effort_mode(exercise_id, mode)
    })?;
    let exercise = library.get(exercise_id)?;

    if app.json {
        return print_json(exercise);
    }
    match mode {
        EffortMode::None => println!("✓ {} no longer records effort", exercise.name),
        _ => println!("✓ {} records effort as {}", exercise.name, mode.as_str().to_uppercase()),
    }
    Ok(())
}

fn cmd_sessions(app: &App, exercise_id: &str, limit: usize) -> Result<()> {
    let library = app.store.library()?;
    let exercise = library.get(exercise_id)?;

    let sets = app.store.fetch_sets(&SetFilter::for_exercise(exercise_id))?;
    let mut sessions = build_sessions(
        &sets,
        exercise.target_reps,
        app.store.calendar(),
        SessionOrder::MostRecentFirst,
    )?;
    sessions.truncate(limit);

    if app.json {
        return print_json(&sessions);
    }
    if sessions.is_empty() {
        println!("No sessions logged for {}.", exercise.name);
        return Ok(());
    }

    println!("{}", exercise.name);
    for session in &sessions {
        let e1rm = session
            .estimated_one_rep_max
            .map(|v| format!("{:.1}", from_canonical(v, exercise.unit)))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {}  {} sets  top {:.1} {}  volume {:.1} kg  e1RM {}{}",
            session.date,
            session.sets.len(),
            from_canonical(session.top_weight, exercise.unit),
            exercise.unit,
            session.total_volume,
            e1rm,
            if session.hit_target_reps { "  ✓ target" } else { "" }
        );
        for set in &session.sets {
            println!("    {}. {}", set.order, describe_set(set));
        }
    }
    Ok(())
}

fn cmd_progress(app: &App, exercise_id: Option<&str>) -> Result<()> {
    let library = app.store.library()?;
    let sets = app.store.fetch_sets(&SetFilter::default())?;

    let exercises: Vec<&Exercise> = match exercise_id {
        Some(id) => vec![library.get(id)?],
        None => library
            .exercises
            .values()
            .filter(|e| sets.iter().any(|s| s.exercise_id == e.id))
            .collect(),
    };

    let mut results = Vec::new();
    for exercise in exercises {
        let status = classify_exercise(
            exercise,
            &sets,
            app.store.calendar(),
            &app.config.progression,
        )?;
        results.push((exercise, status));
    }

    if app.json {
        let rows: Vec<serde_json::Value> = results
            .iter()
            .map(|(exercise, status)| {
                serde_json::json!({
                    "exercise_id": exercise.id,
                    "exercise_name": exercise.name,
                    "unit": exercise.unit,
                    "progression": status,
                    "recommended_weight": status.recommended_weight_in(exercise.unit),
                })
            })
            .collect();
        return print_json(&rows);
    }
    if results.is_empty() {
        println!("No sets logged yet.");
        return Ok(());
    }

    for (exercise, status) in &results {
        match status.recommended_weight_in(exercise.unit) {
            Some(weight) => println!(
                "{:<26} {} (next: {:.1} {})",
                exercise.name,
                status.label(),
                weight,
                exercise.unit
            ),
            None => println!("{:<26} {}", exercise.name, status),
        }
    }
    Ok(())
}

fn cmd_prs(app: &App, limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(app.config.insights.recent_pr_limit);
    let sets = app.store.fetch_sets(&SetFilter::completed())?;
    let exercises = app.store.fetch_exercises()?;
    let records = detect_recent_prs(&sets, &exercises, limit, app.store.calendar())?;

    if app.json {
        return print_json(&records);
    }
    if records.is_empty() {
        println!("No personal records yet.");
        return Ok(());
    }

    for record in &records {
        let e1rm = record
            .estimated_one_rep_max
            .map(|v| format!("  e1RM {:.1} {}", v, record.unit))
            .unwrap_or_default();
        println!(
            "{}  {:<26} {} {} x {}  volume {:.1} kg{}",
            record.date,
            record.exercise_name,
            record.weight,
            record.unit,
            record.reps,
            record.volume,
            e1rm
        );
    }
    Ok(())
}

fn cmd_trend(app: &App, days: Option<u32>, weeks: Option<u32>) -> Result<()> {
    let sets = app.store.fetch_sets(&SetFilter::completed())?;

    if let Some(weeks) = weeks {
        let trend = weekly_volume_trend(&app.ctx, weeks, &sets)?;
        if app.json {
            return print_json(&trend);
        }
        for point in &trend {
            println!("week of {}  {:>10.1} kg", point.week_start, point.volume);
        }
        return Ok(());
    }

    let trend = volume_trend(&app.ctx, days.unwrap_or(7), &sets)?;
    if app.json {
        return print_json(&trend);
    }
    for point in &trend {
        println!("{}  {:>10.1} kg", point.date, point.volume);
    }
    Ok(())
}

fn cmd_breakdown(app: &App, days: u32) -> Result<()> {
    let sets = app.store.fetch_sets(&SetFilter::completed())?;
    let exercises = app.store.fetch_exercises()?;
    let shares = muscle_group_breakdown_top(
        &app.ctx,
        days,
        &sets,
        &exercises,
        app.config.insights.breakdown_top_n,
    )?;

    if app.json {
        return print_json(&shares);
    }
    if shares.is_empty() {
        println!("No volume logged in the last {} days.", days);
        return Ok(());
    }

    for share in &shares {
        println!(
            "{:<12} {:>5.1}%  {:.1} kg",
            share.category.to_string(),
            share.percentage,
            share.volume
        );
    }
    Ok(())
}

fn cmd_summary(app: &App, days: u32) -> Result<()> {
    let sets = app.store.fetch_sets(&SetFilter::default())?;
    let exercises = app.store.fetch_exercises()?;
    let summary = period_summary(&app.ctx, days, &sets, &exercises)?;

    if app.json {
        return print_json(&summary);
    }
    println!("{} to {}", summary.start, summary.end);
    println!("  Workouts:         {}", summary.workouts);
    println!("  Sets:             {}", summary.sets);
    println!("  Volume:           {:.1} kg", summary.total_volume);
    println!("  Personal records: {}", summary.personal_records);
    Ok(())
}

fn cmd_export(app: &App, output: Option<PathBuf>) -> Result<()> {
    let path = output.unwrap_or_else(|| app.data_dir.join("sets.csv"));
    let sets = app.store.fetch_sets(&SetFilter::default())?;
    let exercises = app.store.fetch_exercises()?;

    let count = liftlog_core::csv_export::export_sets(&sets, &exercises, app.store.calendar(), &path)?;

    println!("✓ Exported {} sets to CSV", count);
    println!("  CSV: {}", path.display());
    Ok(())
}
