//! Console summary printed after a run

use crate::pipeline::RunSummary;
use colored::Colorize;

/// Print the aggregate outcome of a run to stdout
pub fn print_summary(summary: &RunSummary) {
    let registration = &summary.registration;
    let import = &summary.import;

    println!();
    println!("{}", "Bootstrap Summary:".cyan().bold());
    println!("  Mode:     {}", summary.mode);
    println!("  Started:  {}", summary.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!();

    println!("{}", "Database connections:".cyan().bold());
    println!("  Created:          {}", registration.created);
    println!("  Already present:  {}", registration.already_present);
    println!("  Failed:           {}", count(registration.failed));
    if summary.mode.is_production() {
        println!("  Skipped:          {}", registration.skipped);
    }
    println!();

    println!("{}", "Artifacts:".cyan().bold());
    for kind in &import.kinds {
        let mut line = format!(
            "  {:<10} {} uploaded, {} failed",
            kind.kind.to_string(),
            kind.uploaded,
            count(kind.failed)
        );
        if kind.excluded > 0 {
            line.push_str(&format!(", {} excluded", kind.excluded));
        }
        println!("{line}");
    }
    println!(
        "  Total:     {} processed, {} uploaded, {} failed",
        import.processed(),
        import.uploaded(),
        count(import.failed())
    );
    println!();

    if summary.is_clean() {
        println!("{}", "Bootstrap completed successfully".green().bold());
    } else {
        println!("{}", "Bootstrap completed with errors".yellow().bold());
    }
}

fn count(n: usize) -> String {
    if n == 0 {
        n.to_string()
    } else {
        n.to_string().red().to_string()
    }
}
