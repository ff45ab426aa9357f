//! Terminal rendering of chat messages

use colored::*;
use parley_common::Role;
use parley_llm::{SegmentedResponse, segment};
use regex::Regex;
use std::sync::LazyLock;
use termimad::MadSkin;

static MARKDOWN_LINK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").ok());

/// Replace Markdown links with OSC 8 hyperlinks for supported terminals.
pub fn add_osc8_hyperlinks(input: &str) -> String {
    match MARKDOWN_LINK.as_ref() {
        Some(re) => re
            .replace_all(input, |caps: &regex::Captures| {
                let text = &caps[1];
                let url = &caps[2];
                format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", url, text)
            })
            .to_string(),
        None => input.to_string(),
    }
}

/// Plain lines describing the thinking steps of a reply
pub fn thinking_lines(thinking: &[String], expanded: bool) -> Vec<String> {
    if thinking.is_empty() {
        return Vec::new();
    }

    if !expanded {
        let steps = if thinking.len() == 1 { "step" } else { "steps" };
        return vec![format!(
            "▸ View thinking process ({} {}, /thinking to expand)",
            thinking.len(),
            steps
        )];
    }

    let mut lines = Vec::new();
    for (i, step) in thinking.iter().enumerate() {
        lines.push(format!("Thinking step {}:", i + 1));
        lines.push(step.clone());
    }
    lines.push("─".repeat(40));
    lines
}

fn role_label(role: Role) -> ColoredString {
    match role {
        Role::User => "You:".bright_cyan().bold(),
        Role::Assistant => "Assistant:".bright_green().bold(),
        Role::System => "System:".bright_magenta().bold(),
    }
}

/// Print an already segmented message. An empty answer prints no body.
pub fn display_segmented(
    skin: &MadSkin,
    role: Role,
    segmented: &SegmentedResponse,
    show_thinking: bool,
) {
    println!("{}", role_label(role));

    for line in thinking_lines(&segmented.thinking, show_thinking) {
        println!("{}", line.dimmed());
    }

    if let Some(main) = segmented.main_content() {
        let formatted = add_osc8_hyperlinks(main);
        println!("{}", skin.term_text(&formatted));
    }
}

/// Segment and print a message
pub fn display_message(skin: &MadSkin, role: Role, content: &str, show_thinking: bool) {
    display_segmented(skin, role, &segment(content), show_thinking);
}

pub fn display_error(message: impl std::fmt::Display) {
    println!("{}", format!("❌ {}", message).red());
}
