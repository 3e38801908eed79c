//! Run summary formatters.
//!
//! Prints what a sync did (per-channel message counts, per-route totals,
//! failures and the snapshot path) either as a table or as JSON.

use crate::aggregate::{RouteTable, totals};
use crate::error::Result;
use crate::pipeline::{SyncOutcome, SyncSummary};
use crate::report_helpers;
use crate::window::TimeWindow;

const BOUND_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f UTC";

/// Issue share as a percentage string, "-" when there are no messages.
pub(crate) fn issue_share(issues: u64, total: u64) -> String {
    if total == 0 {
        "-".to_string()
    } else {
        format!("{:.1}%", issues as f64 * 100.0 / total as f64)
    }
}

pub(crate) fn window_line(window: &TimeWindow) -> String {
    format!(
        "{}  ({} .. {})",
        window.week_key,
        window.start.format(BOUND_FORMAT),
        window.end.format(BOUND_FORMAT)
    )
}

pub fn print_window(window: &TimeWindow) {
    println!("{}", window_line(window));
}

pub fn print_outcome(outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::AlreadySynced { window } => {
            println!(
                "Week {} already synced, nothing to do (use --force to rebuild).",
                window.week_key
            );
        }
        SyncOutcome::Completed(summary) => print_summary(summary),
    }
}

fn print_summary(summary: &SyncSummary) {
    println!("Week {}", window_line(&summary.window));
    println!();
    print_channels(&summary.per_channel);
    println!();
    print_routes(&summary.routes);

    if !summary.failures.is_empty() {
        println!();
        println!("Failed channels:");
        for failure in &summary.failures {
            println!("  {failure}");
        }
    }
    if let Some(path) = &summary.snapshot {
        println!();
        println!("Snapshot written to {}", path.display());
    }
}

fn print_channels(per_channel: &[(String, usize)]) {
    let width = report_helpers::max_label_width(per_channel.iter().map(|(c, _)| c.as_str()), 7);
    let separator = report_helpers::separator(width + 12);
    println!(" {:<width$}  {:>8}", "Channel", "Messages");
    println!("{separator}");
    for (channel, count) in per_channel {
        println!(" {channel:<width$}  {count:>8}");
    }
}

fn print_routes(routes: &RouteTable) {
    if routes.is_empty() {
        println!("No messages in this week.");
        return;
    }

    let width = report_helpers::max_label_width(routes.keys().map(String::as_str), 5);
    let separator = report_helpers::separator(width + 30);
    println!(
        " {:<width$}  {:>8} {:>8} {:>8}",
        "Route", "Messages", "Issues", "Issue %"
    );
    println!("{separator}");
    for (route, c) in routes {
        println!(
            " {:<width$}  {:>8} {:>8} {:>8}",
            route,
            c.total_msgs,
            c.issue_msgs,
            issue_share(c.issue_msgs, c.total_msgs)
        );
    }
    println!("{separator}");
    let sum = totals(routes);
    println!(
        " {:<width$}  {:>8} {:>8} {:>8}",
        "Total",
        sum.total_msgs,
        sum.issue_msgs,
        issue_share(sum.issue_msgs, sum.total_msgs)
    );
}

pub fn print_json(outcome: &SyncOutcome) -> Result<()> {
    report_helpers::print_json_stdout(outcome)
}

#[cfg(test)]
#[path = "summary_test.rs"]
mod tests;
