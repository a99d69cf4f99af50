use crate::application::import::LedgerEntry;
use crate::error::{LedgerError, Result};
use std::io::Read;

/// Reads ledger entries from a CSV source with the header
/// `type,tx,account,amount,currency,target`.
///
/// Whitespace around fields is trimmed and trailing optional columns may be
/// left out.
pub struct LedgerReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> LedgerReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes entries, one `Result` per record.
    pub fn entries(self) -> impl Iterator<Item = Result<LedgerEntry>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}
