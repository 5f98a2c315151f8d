//! Setup/initialization module - handles application startup tasks
//!
//! Includes:
//! - Logger initialization
//! - Output folder initialization

use anstyle::{AnsiColor, Style};
use anyhow::{Context, Result};
use env_logger::{Builder, Env};
use log::kv::Key;
use std::{fs, io::Write, path::Path};

const DURATION_WIDTH: usize = 10;

// ────────────────────────────────────────────────────────────────
// Folder Initialization
// ────────────────────────────────────────────────────────────────

pub fn initialize_output_folder(out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory {:?}", out_dir))
}

// ────────────────────────────────────────────────────────────────
// Logger Initialization
// ────────────────────────────────────────────────────────────────

/// Install the global logger. `RUST_LOG` overrides the default `info` filter.
pub fn initialize_logger() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let dim = Style::new().dimmed();
            let cyan = Style::new().fg_color(Some(AnsiColor::Cyan.into()));

            let ts = buf.timestamp();
            let level_style = buf.default_level_style(record.level());

            let dur_raw = record
                .key_values()
                .get(Key::from("duration"))
                .map(|v| format_duration(&v.to_string()))
                .unwrap_or_default();

            let dur = if dur_raw.is_empty() {
                " ".repeat(DURATION_WIDTH)
            } else {
                format!(
                    "{}{:>width$}{}",
                    cyan.render(),
                    dur_raw,
                    cyan.render_reset(),
                    width = DURATION_WIDTH
                )
            };

            let message = format!("{}", record.args());
            let mut lines = message.lines();

            write!(
                buf,
                "{}{}{} {}{:<5}{} {}",
                dim.render(),
                ts,
                dim.render_reset(),
                level_style.render(),
                record.level(),
                level_style.render_reset(),
                dur
            )?;
            writeln!(buf, " {}", lines.next().unwrap_or_default())?;

            // Continuation lines line up under the message column
            let indent = " ".repeat(DURATION_WIDTH + 1);
            for line in lines {
                writeln!(buf, "{}{}", indent, line)?;
            }

            Ok(())
        })
        .init();
}

/// `"1.234567s"` becomes `"1.23 s"`; anything unparsable passes through.
fn format_duration(raw: &str) -> String {
    if let Some(idx) = raw.find(|c: char| c.is_alphabetic()) {
        let (num, unit) = (&raw[..idx], &raw[idx..]);
        if let Ok(val) = num.parse::<f32>() {
            return format!("{:.2} {}", val, unit);
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_are_shortened() {
        assert_eq!(format_duration("1.234567s"), "1.23 s");
        assert_eq!(format_duration("15.5ms"), "15.50 ms");
        assert_eq!(format_duration("soon"), "soon");
    }
}
