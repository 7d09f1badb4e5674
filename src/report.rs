use std::{fmt::Display, ops::Range};

use colored::Colorize;
use tabled::{builder::Builder, settings::Style};

use crate::analysis::State;

/// Mapped pages coalesced into half-open ranges.
pub fn mapped_ranges(state: &State) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = vec![];
    for page in state.mapped_pages() {
        match ranges.last_mut() {
            Some(last) if last.end == page => last.end = page + 1,
            _ => ranges.push(page..page + 1),
        }
    }
    ranges
}

fn printable(value: &[u8]) -> String {
    String::from_utf8_lossy(value).escape_debug().to_string()
}

pub fn render_state(state: &State) -> String {
    let mut builder = Builder::new();
    builder.push_record(["resource", "producers"]);
    for kind in state.resource_kinds() {
        builder.push_record([kind.to_owned(), state.resources(kind).len().to_string()]);
    }
    let resources = builder.build().with(Style::ascii_rounded()).to_string();

    let mut inputs: Vec<[String; 2]> = state
        .strings()
        .iter()
        .map(|value| ["string".to_owned(), printable(value)])
        .chain(
            state
                .files()
                .iter()
                .map(|value| ["file".to_owned(), printable(value)]),
        )
        .collect();
    inputs.sort();
    let mut builder = Builder::new();
    builder.push_record(["input", "value"]);
    for row in inputs {
        builder.push_record(row);
    }
    let inputs = builder.build().with(Style::ascii_rounded()).to_string();

    let pages = mapped_ranges(state)
        .iter()
        .map(|range| format!("[{}, {})", range.start, range.end))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "{}\n{}\n{}\n{}\n{} {}",
        "resources".bright_blue(),
        resources,
        "inputs".bright_blue(),
        inputs,
        "mapped pages:".bright_blue(),
        pages
    )
}

impl Display for State<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", render_state(self))
    }
}
