// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::{error, info};

use worldcup::config::{Cli, Command};
use worldcup::logging::init_logging;
use worldcup::{import_if_empty, GroupedView, ImportOutcome, SeedSource, TeamStore};

/// Where the TUI logs when no log file is configured
const UI_LOG_FILE: &str = "worldcup.log";

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.selected_command();

    let fallback_log = (command == Command::Ui).then(|| Path::new(UI_LOG_FILE));
    init_logging(&cli.logging, fallback_log)?;

    // Unreadable store is fatal: nothing to show without it
    let mut store = TeamStore::open(&cli.db)
        .with_context(|| format!("Failed to open team store at {}", cli.db.display()))?;

    let source = SeedSource::from_override(cli.seed.clone());
    let outcome = import_if_empty(&mut store, &source).context("Seed import failed")?;

    match command {
        Command::Import => report_import(&outcome, &store),
        Command::Show => {
            print!("{}", format_standings(store.grouped_view()));
            Ok(())
        }
        Command::Ui => run_ui_mode(store),
    }
}

fn report_import(outcome: &ImportOutcome, store: &TeamStore) -> Result<()> {
    match outcome {
        ImportOutcome::Imported(count) => println!("✓ Imported {} teams", count),
        ImportOutcome::Skipped(existing) => {
            println!("✓ Store already holds {} teams, nothing imported", existing)
        }
        ImportOutcome::Aborted(reason) => println!("✗ Seed data is malformed: {}", reason),
    }
    println!("✓ Store contains {} teams", store.count()?);
    Ok(())
}

fn format_standings(view: &GroupedView) -> String {
    let mut out = String::new();
    for section in view.sections() {
        out.push_str(section.name());
        out.push('\n');
        for team in &section.teams {
            out.push_str(&format!("  {:<24} {}\n", team.display_name(), team.score_label()));
        }
    }
    out
}

#[cfg(feature = "tui")]
fn run_ui_mode(store: TeamStore) -> Result<()> {
    use worldcup::{ListPresenter, TableModel};

    info!(teams = store.grouped_view().total_rows(), "starting UI");
    let presenter = ListPresenter::new(store, TableModel::new());
    let mut app = ui::App::new(presenter);
    ui::run_ui(&mut app)?;

    // flush anything still staged, like the app's terminate hook
    if let Err(err) = app.presenter.save() {
        error!(error = %err, "failed to save on exit");
        return Err(err).context("Failed to save changes on exit");
    }
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_store: TeamStore) -> Result<()> {
    error!("TUI mode not available");
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or print the standings: worldcup show");
    std::process::exit(1);
}
