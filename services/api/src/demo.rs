use crate::infra::{build_session, load_list, parse_command};
use clap::Args;
use preference_sync::config::PreferenceConfig;
use preference_sync::error::AppError;
use preference_sync::workflows::preferences::{
    ChangeNotification, ChangeSink, CommandOutcome, PreferenceCommand, PreferenceLimits,
    PreferenceSession, RowOp, DEFAULT_FORM_PREFIX,
};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// CSV export (item_id,rank) to seed the list with before the commands run.
    #[arg(long)]
    pub(crate) initial_csv: Option<PathBuf>,
    /// Minimum number of preferences a submission must carry.
    #[arg(long)]
    pub(crate) min_count: Option<usize>,
    /// Maximum number of preferences a submission may carry.
    #[arg(long)]
    pub(crate) max_count: Option<usize>,
    /// Commands to apply in order, e.g. `add:P1 up:P3 remove:P2`.
    #[arg(value_parser = parse_command)]
    pub(crate) commands: Vec<PreferenceCommand>,
}

/// Prints each applied change as it is published.
#[derive(Debug, Default, Clone, Copy)]
struct ConsoleSink;

impl ChangeSink for ConsoleSink {
    fn publish(&self, notification: &ChangeNotification) {
        println!(
            "- {} {} (total {})",
            notification.kind.label(),
            notification.item_id,
            notification.total_count
        );
        for op in &notification.row_ops {
            println!("    {}", describe_row_op(op));
        }
    }
}

fn describe_row_op(op: &RowOp) -> String {
    match op {
        RowOp::Insert { row, rank } => format!("insert row {} at rank {}", row.0, rank),
        RowOp::Relabel { row, rank } => format!("relabel row {} as rank {}", row.0, rank),
        RowOp::Relocate {
            row,
            anchor,
            placement,
        } => format!("move row {} {:?} row {}", row.0, placement, anchor.0),
        RowOp::Delete { row } => format!("delete row {}", row.0),
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        initial_csv,
        min_count,
        max_count,
        commands,
    } = args;

    let config = PreferenceConfig::new(
        PreferenceLimits {
            min: min_count,
            max: max_count,
        },
        None,
    )?;
    let list = load_list(initial_csv.as_deref(), config.min_count())?;

    println!("Preference list demo");
    let mut session = build_session(list, &config, ConsoleSink);
    render_entries(&session);

    if !commands.is_empty() {
        println!("\nApplying {} command(s)", commands.len());
    }
    for command in commands {
        match session.dispatch(command) {
            Ok(CommandOutcome::Applied(_)) => {}
            Ok(CommandOutcome::Ignored { item_id, direction }) => {
                println!("- ignored: {} is already at the {} end", item_id, direction.label());
            }
            Err(err) => println!("- rejected: {}", err),
        }
    }

    println!();
    render_entries(&session);

    println!("\nSubmission");
    match session.submission() {
        Ok(snapshot) => {
            for (name, value) in snapshot.form_fields(DEFAULT_FORM_PREFIX) {
                println!("  {} = {}", name, value);
            }
        }
        Err(err) => println!("  Submission rejected: {}", err),
    }

    Ok(())
}

fn render_entries<S: ChangeSink>(session: &PreferenceSession<S>) {
    let view = session.view();
    println!("Current preferences ({} total)", view.total_count);
    for entry in &view.entries {
        let up = if entry.can_move_up { "up" } else { "--" };
        let down = if entry.can_move_down { "down" } else { "----" };
        println!("  {:>3}. {:<12} [{} {}]", entry.rank, entry.item_id.as_str(), up, down);
    }
    for slot in &view.empty_slots {
        println!("  {:>3}. (empty)", slot.rank());
    }
}
