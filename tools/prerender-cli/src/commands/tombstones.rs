//! Tombstone list validation.

use anyhow::Result;
use serde::Serialize;

use job_prerender::tombstones::{is_tombstoned, TombstoneSet};

use super::TombstonesArgs;
use crate::context::Context;

#[derive(Debug, Serialize)]
struct TombstoneReport<'a> {
    count: usize,
    /// Non-blank lines past the entry limit.
    dropped: usize,
    /// Lines that are not absolute paths; they can never match a request.
    suspicious: Vec<&'a str>,
    checks: Vec<Check<'a>>,
}

#[derive(Debug, Serialize)]
struct Check<'a> {
    path: &'a str,
    tombstoned: bool,
}

/// Run the tombstones command.
pub fn run(args: TombstonesArgs, ctx: &Context) -> Result<()> {
    let text = ctx.read_input(&args.file)?;
    let limits = ctx.limits()?;
    let set = TombstoneSet::parse(&text, limits.max_tombstone_entries);
    let report = report(&text, &set, &args.check, limits.max_tombstone_entries);

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    ctx.output.header("Tombstone list");
    ctx.output.kv("Paths", &report.count.to_string());
    if ctx.output.is_verbose() {
        for path in set.sorted() {
            ctx.output.list_item(path);
        }
    }

    if report.dropped > 0 {
        ctx.output.warn(&format!(
            "{} lines past the limit of {} were ignored",
            report.dropped, limits.max_tombstone_entries
        ));
    }
    for line in &report.suspicious {
        ctx.output.warn(&format!("Not an absolute path: {}", line));
    }

    for check in &report.checks {
        if check.tombstoned {
            ctx.output.success(&format!("{} -> 410 Gone", check.path));
        } else {
            ctx.output.info(&format!("{} -> not tombstoned", check.path));
        }
    }

    Ok(())
}

fn report<'a>(
    text: &'a str,
    set: &TombstoneSet,
    checks: &'a [String],
    max_entries: usize,
) -> TombstoneReport<'a> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    TombstoneReport {
        count: set.len(),
        dropped: lines.len().saturating_sub(max_entries),
        suspicious: lines.into_iter().filter(|l| !l.starts_with('/')).collect(),
        checks: checks
            .iter()
            .map(|path| Check {
                path,
                tombstoned: is_tombstoned(set, path),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report() {
        let text = "/job/old\n\njob/missing-slash\n/job/older\n";
        let set = TombstoneSet::parse(text, 2);
        let checks = vec!["/job/old".to_string(), "/job/new".to_string()];
        let report = report(text, &set, &checks, 2);

        assert_eq!(report.count, 2);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.suspicious, vec!["job/missing-slash"]);
        assert!(report.checks[0].tombstoned);
        assert!(!report.checks[1].tombstoned);
    }
}
