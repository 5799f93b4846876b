use crate::Result;
use crate::facts::PackageRecord;
use core::fmt::Write;
use owo_colors::OwoColorize;

const ELLIPSIS: &str = "...";
const COLUMN_GAP: &str = "  ";

struct Column {
    title: &'static str,
    max_width: Option<usize>,
    right_aligned: bool,
}

const COLUMNS: [Column; 9] = [
    Column { title: "name", max_width: Some(30), right_aligned: false },
    Column { title: "score", max_width: None, right_aligned: true },
    Column { title: "downloads", max_width: None, right_aligned: true },
    Column { title: "summary", max_width: Some(50), right_aligned: false },
    Column { title: "version", max_width: None, right_aligned: false },
    Column { title: "home_page", max_width: Some(50), right_aligned: false },
    Column { title: "stars", max_width: None, right_aligned: true },
    Column { title: "releases", max_width: None, right_aligned: true },
    Column { title: "last_release_date", max_width: None, right_aligned: false },
];

pub fn generate<W: Write>(records: &[PackageRecord], use_colors: bool, writer: &mut W) -> Result<()> {
    if records.is_empty() {
        writeln!(writer, "No matching packages found")?;
        return Ok(());
    }

    writeln!(writer, "Found {} packages:", records.len())?;
    writeln!(writer)?;

    let rows: Vec<[String; 9]> = records.iter().map(cells).collect();
    let widths: Vec<usize> = COLUMNS
        .iter()
        .enumerate()
        .map(|(i, column)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(core::iter::once(column.title.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = COLUMNS
        .iter()
        .zip(&widths)
        .map(|(column, &width)| {
            let padded = pad(column.title, width, column.right_aligned);
            if use_colors { padded.bold().to_string() } else { padded }
        })
        .collect();
    write_line(writer, &header)?;

    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    write_line(writer, &rule)?;

    for row in &rows {
        let line: Vec<String> = COLUMNS
            .iter()
            .zip(&widths)
            .zip(row)
            .map(|((column, &width), cell)| pad(cell, width, column.right_aligned))
            .collect();
        write_line(writer, &line)?;
    }

    Ok(())
}

fn cells(record: &PackageRecord) -> [String; 9] {
    let text = |value: Option<&str>, column: usize| {
        let value = value.unwrap_or_default();
        COLUMNS[column].max_width.map_or_else(|| value.to_string(), |max| truncate(value, max))
    };
    let number = |value: Option<u64>| value.map(|v| v.to_string()).unwrap_or_default();

    [
        text(Some(record.name.as_str()), 0),
        record.score.map(|s| s.to_string()).unwrap_or_default(),
        number(record.downloads),
        text(record.summary.as_deref(), 3),
        text(record.version.as_deref(), 4),
        text(record.home_page.as_deref(), 5),
        number(record.stars),
        number(record.releases),
        record.last_release_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
    ]
}

/// Cut `value` to `max` characters, marking the cut with an ellipsis.
fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let mut cut: String = value.chars().take(max).collect();
        cut.push_str(ELLIPSIS);
        cut
    }
}

fn pad(value: &str, width: usize, right_aligned: bool) -> String {
    if right_aligned {
        format!("{value:>width$}")
    } else {
        format!("{value:<width$}")
    }
}

fn write_line<W: Write>(writer: &mut W, cells: &[String]) -> Result<()> {
    writeln!(writer, "{}", cells.join(COLUMN_GAP).trim_end())?;
    Ok(())
}
