use crate::metrics::LatencySummary;

use super::runner::RunReport;

/// Milliseconds per second.
const MS_PER_SEC: u64 = 1_000;
/// Hundredths-of-a-second per millisecond divisor.
const MS_PER_CENTISECOND: u64 = 10;
/// Elapsed time never drops below this, so rates stay finite.
const MIN_ELAPSED_MS: u64 = 1;

const TABLE_HEADERS: [&str; 9] = [
    "Stat", "2.5%", "50%", "97.5%", "99%", "Avg", "Stdev", "Min", "Max",
];

/// Renders the totals block followed by the latency table.
#[must_use]
pub fn report_lines(report: &RunReport) -> Vec<String> {
    let elapsed_ms = u64::try_from(report.elapsed.as_millis())
        .unwrap_or(u64::MAX)
        .max(MIN_ELAPSED_MS);
    let counters = &report.counters;

    let mut lines = vec![String::new()];
    lines.push(format!(
        "Requests:                       {:>10} hits",
        counters.requests
    ));
    lines.push(format!(
        "Successful requests:            {:>10} hits",
        counters.success
    ));
    lines.push(format!(
        "Network failed:                 {:>10} hits",
        counters.network_failed
    ));
    lines.push(format!(
        "Bad requests failed (!2xx):     {:>10} hits",
        counters.bad_failed
    ));
    lines.push(format!(
        "Successful requests rate:       {:>10} hits/sec",
        per_second(counters.success, elapsed_ms)
    ));
    lines.push(format!(
        "Read throughput:                {:>10} bytes/sec",
        per_second(report.throughput.bytes_read, elapsed_ms)
    ));
    lines.push(format!(
        "Write throughput:               {:>10} bytes/sec",
        per_second(report.throughput.bytes_written, elapsed_ms)
    ));
    lines.push(format!(
        "Test time:                      {:>10} sec",
        format_seconds(elapsed_ms)
    ));
    lines.push(String::new());
    lines.extend(latency_table(&report.latency));
    lines.push(String::new());
    lines
}

pub fn print_report(report: &RunReport) {
    for line in report_lines(report) {
        println!("{}", line);
    }
}

/// `count` per second over `elapsed_ms`, rounded to the nearest whole unit.
pub(crate) fn per_second(count: u64, elapsed_ms: u64) -> u64 {
    let elapsed = u128::from(elapsed_ms.max(MIN_ELAPSED_MS));
    let scaled = u128::from(count)
        .saturating_mul(u128::from(MS_PER_SEC))
        .saturating_add(elapsed.checked_div(2).unwrap_or(0))
        .checked_div(elapsed)
        .unwrap_or(0);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

pub(crate) fn format_seconds(elapsed_ms: u64) -> String {
    let secs = elapsed_ms.checked_div(MS_PER_SEC).unwrap_or(0);
    let centis = elapsed_ms
        .checked_rem(MS_PER_SEC)
        .unwrap_or(0)
        .checked_div(MS_PER_CENTISECOND)
        .unwrap_or(0);
    format!("{}.{:02}", secs, centis)
}

fn latency_table(latency: &LatencySummary) -> Vec<String> {
    let row = [
        "Latency".to_owned(),
        format!("{} ms", latency.p2_5),
        format!("{} ms", latency.p50),
        format!("{} ms", latency.p97_5),
        format!("{} ms", latency.p99),
        format!("{:.2} ms", latency.mean),
        format!("{:.2} ms", latency.stdev),
        format!("{} ms", latency.min),
        format!("{} ms", latency.max),
    ];
    let widths: Vec<usize> = TABLE_HEADERS
        .iter()
        .zip(row.iter())
        .map(|(header, cell)| header.len().max(cell.len()))
        .collect();

    let border = format!(
        "+{}+",
        widths
            .iter()
            .map(|width| "-".repeat(width.saturating_add(2)))
            .collect::<Vec<_>>()
            .join("+")
    );
    let render = |cells: Vec<&str>| {
        let padded: Vec<String> = widths
            .iter()
            .zip(cells)
            .map(|(width, cell)| format!(" {:^width$} ", cell, width = *width))
            .collect();
        format!("|{}|", padded.join("|"))
    };
    let header_line = render(TABLE_HEADERS.to_vec());
    let row_line = render(row.iter().map(String::as_str).collect());

    vec![border.clone(), header_line, border.clone(), row_line, border]
}
