//! InfluxDB line protocol.
//!
//! `measurement,tag=value field=valuei,field=valuei`

use std::fmt::Write;

/// A single point with integer fields, rendered with [`LinePoint::to_line`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinePoint {
    measurement: String,
    tags: Vec<(String, String)>,
    fields: Vec<(String, i64)>,
}

impl LinePoint {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    pub fn int(mut self, key: impl Into<String>, value: i64) -> Self {
        self.fields.push((key.into(), value));
        self
    }

    /// Add an integer field only when a value is present.
    pub fn int_opt(self, key: impl Into<String>, value: Option<i64>) -> Self {
        match value {
            Some(v) => self.int(key, v),
            None => self,
        }
    }

    pub fn to_line(&self) -> String {
        let mut line = escape(&self.measurement, &[',', ' ']);
        for (key, value) in &self.tags {
            let _ = write!(line, ",{}={}", escape_key(key), escape_key(value));
        }
        for (i, (key, value)) in self.fields.iter().enumerate() {
            let sep = if i == 0 { ' ' } else { ',' };
            let _ = write!(line, "{}{}={}i", sep, escape_key(key), value);
        }
        line
    }
}

fn escape_key(s: &str) -> String {
    escape(s, &[',', '=', ' '])
}

fn escape(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
