//! Bordered progress output for workflow steps.
//!
//! Every command frames its output with [header]/[footer]; in-progress
//! steps print inline via [step] and are closed with [done].

use std::io::{self, Write};

use console::Style;

fn border() -> String {
    Style::new().dim().apply_to("│").to_string()
}

/// Print the command banner and open the border.
pub fn header(title: &str) {
    let badge = Style::new().on_cyan().black().bold().apply_to(" BRANCHFLOW ");
    let title = Style::new().cyan().bold().apply_to(title);
    println!("\n{} {}", badge, title);
    println!("{}", border());
}

/// Close the border.
pub fn footer() {
    println!("{}\n", border());
}

pub fn info(msg: &str) {
    println!("{} {} {}", border(), Style::new().blue().apply_to("ℹ"), msg);
}

/// Start an in-progress step; stays on the current line until [done].
pub fn step(msg: &str) {
    print!("{} {} {}", border(), Style::new().yellow().apply_to("➜"), msg);
    let _ = io::stdout().flush();
}

/// Close the step opened by [step].
pub fn done() {
    println!("{}", Style::new().green().apply_to(" [OK]"));
}

pub fn success(msg: &str) {
    println!("{} {} {}", border(), Style::new().green().apply_to("✔"), msg);
}

pub fn warn(msg: &str) {
    println!("{} {} {}", border(), Style::new().yellow().apply_to("⚠"), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", border(), Style::new().red().apply_to(msg));
}

pub fn dim(msg: &str) {
    println!("{} {}", border(), Style::new().dim().apply_to(msg));
}
