use std::io::{self, Write};

use serde::Serialize;

use crate::app::{BuildResult, ProgressEvent, ProgressSink, ValidateResult};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_validate(result: &ValidateResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_build(result: &BuildResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Human-readable progress and summaries for a terminal.
pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn print_validate(result: &ValidateResult) {
        if result.valid {
            println!("{GREEN}✔ {} is consistent{RESET}", result.data_dir);
            return;
        }
        println!(
            "{YELLOW}⚠ {} issue(s) in {}{RESET}",
            result.issue_count, result.data_dir
        );
        for entry in &result.report.entries {
            println!("{CYAN}{}{RESET}", entry.entity);
            for issue in &entry.issues {
                println!("  - {issue}");
            }
        }
    }

    pub fn print_build(result: &BuildResult) {
        println!("{CYAN}OSC catalog summary{RESET}");
        println!(
            "{GREEN}✔ {} documents written to {}{RESET}",
            result.documents, result.out_dir
        );
        println!(
            "  products: {}  projects: {}  themes: {}  variables: {}  missions: {}",
            result.summary.number_of_products,
            result.summary.number_of_projects,
            result.summary.number_of_themes,
            result.summary.number_of_variables,
            result.summary.number_of_missions,
        );
        println!(
            "  relations: {}  attachments: {}  images: {}",
            result.relations, result.attachments, result.images
        );
        if result.issue_count > 0 {
            println!(
                "{YELLOW}⚠ built with {} validation issue(s){RESET}",
                result.issue_count
            );
        }
    }
}

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("{} ({:.2}s)", event.message, elapsed.as_secs_f64()),
            None => eprintln!("{}", event.message),
        }
    }
}

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";
