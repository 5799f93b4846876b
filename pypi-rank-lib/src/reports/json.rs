use crate::Result;
use crate::facts::PackageRecord;
use core::fmt::Write;

/// Write one JSON object per record, one per line.
pub fn generate<W: Write>(records: &[PackageRecord], writer: &mut W) -> Result<()> {
    for record in records {
        writeln!(writer, "{}", serde_json::to_string(record)?)?;
    }
    Ok(())
}
