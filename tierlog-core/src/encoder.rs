use chrono::{DateTime, FixedOffset, SecondsFormat};
use colored::Colorize;

use crate::{
    level::Level,
    record::{Field, Record, STACKTRACE_KEY},
};

/// Output layout of an encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// One JSON object per line.
    Json,
    /// Tab-separated single line, uncolored.
    Production,
    /// Colored level, stack trace on its own lines.
    Development,
}

/// Turns a record into one output line (several for development stack traces).
#[derive(Debug, Clone, Copy)]
pub struct Encoder {
    format: Format,
    offset: FixedOffset,
}

impl Encoder {
    pub fn new(format: Format, offset: FixedOffset) -> Self {
        Self { format, offset }
    }

    pub fn encode(&self, record: &Record) -> String {
        let time = record.time.with_timezone(&self.offset);
        match self.format {
            Format::Json => encode_json(record, &time),
            Format::Production => encode_production(record, &time),
            Format::Development => encode_development(record, &time),
        }
    }
}

fn rfc3339(time: &DateTime<FixedOffset>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn push_json_str(out: &mut String, s: &str) {
    // Serializing a str into JSON cannot fail.
    out.push_str(&serde_json::to_string(s).unwrap_or_default());
}

fn push_fields<'a>(out: &mut String, fields: impl Iterator<Item = &'a Field>) {
    for field in fields {
        out.push(',');
        push_json_str(out, &field.key);
        out.push(':');
        out.push_str(&field.value.to_string());
    }
}

fn fields_object<'a>(fields: impl Iterator<Item = &'a Field>) -> String {
    let mut out = String::from("{");
    push_fields(&mut out, fields);
    // push_fields leads every entry with a comma
    if out.len() > 1 {
        out.remove(1);
    }
    out.push('}');
    out
}

fn encode_json(record: &Record, time: &DateTime<FixedOffset>) -> String {
    let mut out = String::with_capacity(128 + record.message.len());
    out.push_str("{\"level\":");
    push_json_str(&mut out, record.level.as_str());
    out.push_str(",\"ts\":");
    push_json_str(&mut out, &rfc3339(time));
    out.push_str(",\"msg\":");
    push_json_str(&mut out, &record.message);
    push_fields(&mut out, record.fields.iter());
    out.push('}');
    out
}

fn encode_production(record: &Record, time: &DateTime<FixedOffset>) -> String {
    let mut out = format!("{}\t{}\t{}", rfc3339(time), record.level, record.message);
    if !record.fields.is_empty() {
        out.push('\t');
        out.push_str(&fields_object(record.fields.iter()));
    }
    out
}

fn encode_development(record: &Record, time: &DateTime<FixedOffset>) -> String {
    let time = time.format("%Y-%m-%dT%H:%M:%S%.3f%:z");
    let level = match record.level {
        Level::Debug => Level::Debug.as_upper().blue(),
        Level::Info => Level::Info.as_upper().green(),
        Level::Warn => Level::Warn.as_upper().yellow(),
        Level::Error => Level::Error.as_upper().red(),
        Level::Fatal => Level::Fatal.as_upper().red().bold(),
    };
    let mut out = format!("[{time} {level}] {}", record.message);
    let mut fields = record
        .fields
        .iter()
        .filter(|f| f.key != STACKTRACE_KEY)
        .peekable();
    if fields.peek().is_some() {
        out.push(' ');
        out.push_str(&fields_object(fields));
    }
    if let Some(stack) = record.field(STACKTRACE_KEY) {
        out.push('\n');
        match stack.as_str() {
            Some(stack) => out.push_str(stack.trim_end()),
            None => out.push_str(&stack.to_string()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};

    fn record(level: Level, fields: Vec<Field>) -> Record {
        Record {
            level,
            time: Utc.with_ymd_and_hms(2024, 3, 1, 16, 30, 0).unwrap(),
            message: "user \"ann\" logged in".into(),
            fields,
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_json_layout() {
        let line = Encoder::new(Format::Json, utc()).encode(&record(
            Level::Warn,
            vec![Field::new("attempt", 3), Field::new("ok", false)],
        ));
        assert_eq!(
            line,
            r#"{"level":"warn","ts":"2024-03-01T16:30:00Z","msg":"user \"ann\" logged in","attempt":3,"ok":false}"#
        );
        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["attempt"], json!(3));
    }

    #[test]
    fn test_json_timestamp_offset() {
        let beijing = FixedOffset::east_opt(8 * 3600).unwrap();
        let line = Encoder::new(Format::Json, beijing).encode(&record(Level::Info, vec![]));
        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["ts"], json!("2024-03-02T00:30:00+08:00"));
    }

    #[test]
    fn test_production_layout() {
        let encoder = Encoder::new(Format::Production, utc());
        assert_eq!(
            encoder.encode(&record(Level::Info, vec![])),
            "2024-03-01T16:30:00Z\tinfo\tuser \"ann\" logged in"
        );
        assert_eq!(
            encoder.encode(&record(Level::Error, vec![Field::new("code", 7)])),
            "2024-03-01T16:30:00Z\terror\tuser \"ann\" logged in\t{\"code\":7}"
        );
    }

    #[test]
    fn test_development_layout_moves_stacktrace() {
        let line = Encoder::new(Format::Development, utc()).encode(&record(
            Level::Error,
            vec![
                Field::new("error", "boom"),
                Field::new("stacktrace", "frame 0\nframe 1\n"),
            ],
        ));
        let mut lines = line.lines();
        let head = lines.next().unwrap();
        assert!(head.starts_with("[2024-03-01T16:30:00.000+00:00 "));
        assert!(head.ends_with(r#"user "ann" logged in {"error":"boom"}"#));
        assert_eq!(lines.collect::<Vec<_>>(), vec!["frame 0", "frame 1"]);
    }
}
