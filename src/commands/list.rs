//! Show the latest dev and release branches as a table.

use comfy_table::{Cell, Color, Table};

use crate::config::Config;
use crate::domain::branch::{BranchDescriptor, BranchKind};
use crate::domain::selector;
use crate::error::Result;
use crate::git::{branch_set, GitOps};
use crate::ui::logger;

fn add_rows(table: &mut Table, infos: &[BranchDescriptor], kind_label: &str, color: Color) {
    for info in infos {
        table.add_row(vec![
            Cell::new(kind_label).fg(color),
            Cell::new(&info.name),
            Cell::new(info.date.format("%Y-%m-%d").to_string()),
            Cell::new(info.project.as_deref().unwrap_or("-")),
        ]);
    }
}

fn execute<G: GitOps>(git: &G, config: &Config, count: Option<usize>) -> Result<()> {
    git.fetch_prune()?;
    let names = branch_set(&git.list_all_branches()?, &config.remote);

    let limit = count.unwrap_or(config.list_count);
    let releases = selector::latest_n(&names, BranchKind::Release, limit);
    let devs = selector::latest_n(&names, BranchKind::Dev, limit);

    logger::header(&format!("Branch list (latest {})", limit));

    if releases.is_empty() && devs.is_empty() {
        logger::warn("No conforming dev or release branches found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Type").fg(Color::Cyan),
        Cell::new("Branch Name").fg(Color::Cyan),
        Cell::new("Date").fg(Color::Cyan),
        Cell::new("Project").fg(Color::Cyan),
    ]);
    add_rows(&mut table, &releases, "Release", Color::Green);
    add_rows(&mut table, &devs, "Dev", Color::Yellow);

    println!("{table}");
    Ok(())
}

/// Run the list command; without an explicit count the configured default
/// applies.
pub fn run<G: GitOps>(git: &G, config: &Config, count: Option<usize>) {
    if let Err(err) = execute(git, config, count) {
        logger::error(&format!("Failed to list branches: {}", err));
    }
    logger::footer();
}
