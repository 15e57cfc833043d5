use clap::ValueEnum;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::{self, Write};
use std::time::Duration;

use crate::profile::UserProfile;
use crate::sections::{main_item, Section};
use crate::wire::{FitnessPlan, Tips};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Workout,
    Diet,
}

/// Spinner on stderr while a provider call is in flight.
pub fn spinner(msg: &str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()));
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn render_plan(plan: &FitnessPlan, tab: Tab) -> String {
    let mut out = String::new();
    match tab {
        Tab::Workout => {
            let _ = writeln!(out, "\n{}", "=== WORKOUT PLAN ===".bold());
            let _ = writeln!(out, "{}\n", plan.workout_plan.summary);
            for day in &plan.workout_plan.days {
                let _ = writeln!(out, "{}", day.day.cyan().bold());
                if day.exercises.is_empty() {
                    let _ = writeln!(out, "  (rest day)");
                }
                for ex in &day.exercises {
                    let _ = writeln!(
                        out,
                        "  {}  {} x {}  rest {}",
                        ex.name.bold(),
                        ex.sets,
                        ex.reps,
                        ex.rest
                    );
                }
                out.push('\n');
            }
        }
        Tab::Diet => {
            let _ = writeln!(out, "\n{}", "=== DIET PLAN ===".bold());
            let _ = writeln!(out, "{}\n", plan.diet_plan.summary);
            for (label, items) in plan.diet_plan.meals.groups() {
                let _ = writeln!(out, "{}", label.green().bold());
                for m in items {
                    let _ = writeln!(out, "  - {}", m.item);
                }
                out.push('\n');
            }
        }
    }
    let _ = writeln!(out, "{} \"{}\"", "Motivation:".magenta().bold(), plan.motivation.quote);
    let _ = writeln!(out, "{} {}", "Tip:".magenta().bold(), plan.motivation.tip);
    out
}

/// Printable Markdown copy of the whole plan: both tabs and the motivation
/// block, no colour codes.
pub fn render_document(plan: &FitnessPlan, profile: &UserProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Fitness plan for {}\n", profile.name);
    let _ = writeln!(
        out,
        "{} | {} | {} | {}\n",
        profile.fitness_goal, profile.current_fitness_level, profile.workout_location, profile.dietary_preferences
    );

    let _ = writeln!(out, "## Workout plan\n\n{}\n", plan.workout_plan.summary);
    for day in &plan.workout_plan.days {
        let _ = writeln!(out, "### {}\n", day.day);
        if day.exercises.is_empty() {
            let _ = writeln!(out, "Rest day.");
        }
        for ex in &day.exercises {
            let _ = writeln!(out, "- {}: {} x {}, rest {}", ex.name, ex.sets, ex.reps, ex.rest);
        }
        out.push('\n');
    }

    let _ = writeln!(out, "## Diet plan\n\n{}\n", plan.diet_plan.summary);
    for (label, items) in plan.diet_plan.meals.groups() {
        let _ = writeln!(out, "### {}\n", label);
        for m in items {
            let _ = writeln!(out, "- {}", m.item);
        }
        out.push('\n');
    }

    let _ = writeln!(out, "## Motivation\n\n> {}\n\n{}", plan.motivation.quote, plan.motivation.tip);
    out
}

pub fn render_sections(sections: &[Section]) -> String {
    let mut out = String::new();
    for s in sections {
        let _ = writeln!(out, "{}", s.title.bold());
        for item in &s.items {
            let key = main_item(item);
            if key.is_empty() || key == item.as_str() {
                let _ = writeln!(out, "  - {}", item);
            } else {
                let _ = writeln!(out, "  - {}  {}", item, format!("[{}]", key).dimmed());
            }
        }
        out.push('\n');
    }
    out
}

pub fn render_tips(t: &Tips) -> String {
    format!(
        "{} {}\n{} {}\n{} \"{}\"\n",
        "Fitness:".cyan().bold(),
        t.fitness_tip,
        "Lifestyle:".green().bold(),
        t.lifestyle_tip,
        "Quote:".magenta().bold(),
        t.motivation_quote
    )
}

pub fn confirm(prompt: &str) -> bool {
    print!("{} [y/N]: ", prompt);
    let _ = io::stdout().flush();
    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_ok() {
        let ans = s.trim().to_lowercase();
        ans == "y" || ans == "yes"
    } else {
        false
    }
}
