use crate::stalk::orchestrator::StalkReport;
use chrono::SecondsFormat;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::io::{self, Write};

const WEB_BASE: &str = "https://github.com";

// Path-segment escapes; `/` stays literal so `fix/bug` reads as written.
const REF_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Web link comparing upstream's default branch with a fork branch.
pub fn compare_url(upstream: &str, default_branch: &str, fork_name: &str, branch: &str) -> String {
    let fork_owner = fork_name.split('/').next().unwrap_or(fork_name);
    format!(
        "{WEB_BASE}/{upstream}/compare/{}...{fork_owner}:{}",
        utf8_percent_encode(default_branch, REF_SEGMENT),
        utf8_percent_encode(branch, REF_SEGMENT)
    )
}

/// One line per fork, then one indented line per branch, newest first.
pub fn write_report(report: &StalkReport, out: &mut impl Write) -> io::Result<()> {
    if report.is_empty() {
        writeln!(
            out,
            "No interesting forks of {} since {}",
            report.upstream,
            report.since.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;
        return Ok(());
    }

    for result in &report.forks {
        writeln!(out, "{}", result.fork_name)?;

        let mut branches: Vec<_> = result.branches.iter().collect();
        branches.sort_by(|a, b| {
            b.last_modified
                .cmp(&a.last_modified)
                .then_with(|| a.name.cmp(&b.name))
        });

        for branch in branches {
            writeln!(
                out,
                "\t{} - {}",
                compare_url(
                    &report.upstream,
                    &report.default_branch,
                    &result.fork_name,
                    &branch.name
                ),
                branch.last_modified.to_rfc3339_opts(SecondsFormat::Secs, true)
            )?;
        }
    }

    Ok(())
}
