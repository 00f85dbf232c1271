//! Panel output
//!
//! The panel itself (fonts, bitmaps, LED matrix) lives outside this crate;
//! the loop only hands it a finished [`ArrivalRecord`].

use colored::*;

use crate::domain::{ArrivalRecord, Slot};

pub const QUEENS_LABEL: &str = "Queens";
pub const MANHATTAN_LABEL: &str = "Manhat";

/// Consumes arrival records. Rendering cannot fail.
pub trait Renderer: Send {
    fn render(&mut self, record: &ArrivalRecord);
}

fn times(first: Slot, second: Slot) -> String {
    format!("{},{} m", first, second)
}

/// The four panel lines: label, times, label, times.
pub fn format_lines(record: &ArrivalRecord) -> [String; 4] {
    [
        QUEENS_LABEL.to_string(),
        times(record.queens_first, record.queens_second),
        MANHATTAN_LABEL.to_string(),
        times(record.manhattan_first, record.manhattan_second),
    ]
}

/// Prints the panel lines to stdout, labels white and times yellow.
#[derive(Debug, Default)]
pub struct ConsolePanel;

impl ConsolePanel {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for ConsolePanel {
    fn render(&mut self, record: &ArrivalRecord) {
        let [q_label, q_times, m_label, m_times] = format_lines(record);
        println!("{} {}  {} {}", q_label.white(), q_times.yellow(), m_label.white(), m_times.yellow());
    }
}
