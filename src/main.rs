// Entry point and interactive CLI flow.
//
// - Option [1] loads and cleans the sales CSV, printing diagnostics.
// - Options [2]-[4] move one selector of the Region → District → Territory
//   filter; lower selectors are reset and their choices are reprinted.
// - Option [5] resets all selectors, [6] prints the drill breakdown for the
//   current scope and [7] exports it as CSV plus a JSON summary.
use geo_drill_report::config::parse_goal_override;
use geo_drill_report::error::ReportError;
use geo_drill_report::filters::{FilterUpdate, HierarchicalFilterState, LevelOptions};
use geo_drill_report::reports::{breakdown_rows, drill_breakdown, scope_summary};
use geo_drill_report::types::{Level, LevelValue};
use geo_drill_report::util::{format_currency, format_currency_compact, format_currency_dec, format_int};
use geo_drill_report::{gap_label, loader, output, AppConfig, Aggregator};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

// One user event at a time: every handler holds this lock for its whole
// apply → options → filter → aggregate pass.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { filters: None }));

struct AppState {
    filters: Option<HierarchicalFilterState>,
}

fn app_state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn prompt(label: &str) -> String {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_choice() -> String {
    prompt("Enter choice: ")
}

fn print_options(opts: &LevelOptions) {
    if !opts.enabled {
        println!("  {}: (disabled)", opts.level.all_label());
        return;
    }
    let labels: Vec<String> = opts.options.iter().map(|id| opts.level.option_label(id)).collect();
    println!("  {} | {}", opts.level.all_label(), labels.join(" | "));
}

fn print_update(update: &FilterUpdate, state: &HierarchicalFilterState) {
    for opts in &update.refreshed {
        print_options(opts);
    }
    match state.current_scope_label() {
        Some(scope) => println!("Scope: {}\n", scope),
        None => println!("Scope: All Regions\n"),
    }
}

/// Handle option [1]: load and clean the CSV file.
fn handle_load(config: &AppConfig) -> Result<(), ReportError> {
    let (rows, load_report) = loader::load_rows(&config.data_path)?;
    println!(
        "Processing dataset... ({} rows read, {} loaded)",
        format_int(load_report.total_rows as u64),
        format_int(load_report.loaded_rows as u64)
    );
    println!(
        "Note: {} rows skipped due to parse/validation errors.",
        format_int(load_report.parse_errors as u64)
    );
    if load_report.unknown_ids > 0 {
        println!(
            "Info: {} rows have a blank region, district or territory (grouped as Unknown).",
            format_int(load_report.unknown_ids as u64)
        );
    }
    println!();
    let state = HierarchicalFilterState::new(rows);
    print_options(&state.level_options(Level::Region));
    println!();
    app_state().filters = Some(state);
    Ok(())
}

/// Handle options [2]-[4]: move one selector.
fn handle_select(level: Level) -> Result<(), ReportError> {
    let mut guard = app_state();
    let state = guard.filters.as_mut().ok_or(ReportError::NoData)?;
    let opts = state.level_options(level);
    print_options(&opts);
    let raw = prompt(&format!("{} (or 'all'): ", level.label()));
    let update = state.select(level, LevelValue::parse(&raw));
    print_update(&update, state);
    Ok(())
}

/// Handle option [5]: back to company scope.
fn handle_reset() -> Result<(), ReportError> {
    let mut guard = app_state();
    let state = guard.filters.as_mut().ok_or(ReportError::NoData)?;
    let update = state.reset_current();
    print_update(&update, state);
    Ok(())
}

/// Handle option [6]: print totals and the per-group table.
fn handle_breakdown(aggregator: &Aggregator) -> Result<(), ReportError> {
    let guard = app_state();
    let state = guard.filters.as_ref().ok_or(ReportError::NoData)?;
    let goal_raw = prompt("Goal override (blank for configured goal): ");
    let goal_override = parse_goal_override(&goal_raw)?;

    let breakdown = drill_breakdown(state, aggregator, goal_override);
    println!(
        "\n{} (by {})",
        breakdown.scope.as_deref().unwrap_or("Company"),
        breakdown.group_key.label()
    );
    println!(
        "Lots: {}  Revenue: {}  Avg Lot Value: {}  {} {}  [goal {}]\n",
        format_int(breakdown.total.lots),
        format_currency_compact(breakdown.total.revenue),
        format_currency_dec(breakdown.total.alv),
        breakdown.status.icon(),
        gap_label(breakdown.total.alv, breakdown.goal),
        format_currency(breakdown.goal)
    );
    output::preview_table_rows(&breakdown_rows(&breakdown), 25);
    Ok(())
}

/// Handle option [7]: export the current breakdown.
fn handle_export(config: &AppConfig, aggregator: &Aggregator) -> Result<(), ReportError> {
    let guard = app_state();
    let state = guard.filters.as_ref().ok_or(ReportError::NoData)?;
    let breakdown = drill_breakdown(state, aggregator, None);

    let csv_path = config
        .export_dir
        .join(format!("breakdown_{}.csv", breakdown.drill));
    output::write_csv(&csv_path, &breakdown_rows(&breakdown))?;
    let json_path = config.export_dir.join("scope_summary.json");
    output::write_json(&json_path, &scope_summary(&breakdown))?;
    println!(
        "Exported {} and {}\n",
        csv_path.display(),
        json_path.display()
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };
    let aggregator = Aggregator::new(config.goal);
    tracing::info!(
        data = %config.data_path.display(),
        goal = config.goal.goal,
        "geo drill report starting"
    );

    loop {
        println!("Geo Drill Report");
        println!("[1] Load the file");
        println!("[2] Select region");
        println!("[3] Select district");
        println!("[4] Select territory");
        println!("[5] Reset filters");
        println!("[6] Show breakdown");
        println!("[7] Export breakdown");
        println!("[0] Exit\n");
        let result = match read_choice().as_str() {
            "1" => handle_load(&config),
            "2" => handle_select(Level::Region),
            "3" => handle_select(Level::District),
            "4" => handle_select(Level::Territory),
            "5" => handle_reset(),
            "6" => handle_breakdown(&aggregator),
            "7" => handle_export(&config, &aggregator),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => {
                println!("Invalid choice. Please enter 0-7.\n");
                Ok(())
            }
        };
        if let Err(e) = result {
            eprintln!("Error: {}\n", e);
        }
    }
}
