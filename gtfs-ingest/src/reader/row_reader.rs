use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::ingest_error::IngestError;
use crate::reader::RawRecord;

/// the row-source collaborator boundary: a lazy sequence of field-name to
/// value rows from one delimited feed file, with peek-style availability and
/// a one-row push-back used by the grouped readers.
pub trait RowReader {
    fn available(&mut self) -> bool;
    fn next_row(&mut self) -> Result<RawRecord, IngestError>;
    fn unread_row(&mut self, row: RawRecord);
}

pub struct CsvRowReader<R: Read> {
    headers: Vec<String>,
    records: csv::StringRecordsIntoIter<R>,
    lookahead: VecDeque<RawRecord>,
}

impl CsvRowReader<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<CsvRowReader<File>, IngestError> {
        let file = File::open(path.as_ref()).map_err(|e| {
            IngestError::InvalidDataError(format!(
                "Failed to open feed file {:?}: {e}",
                path.as_ref()
            ))
        })?;
        CsvRowReader::from_reader(file)
    }
}

impl<R: Read> CsvRowReader<R> {
    pub fn from_reader(reader: R) -> Result<CsvRowReader<R>, IngestError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader
            .headers()?
            .iter()
            // feed exports occasionally carry a UTF-8 BOM on the first header
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();
        Ok(CsvRowReader {
            headers,
            records: csv_reader.into_records(),
            lookahead: VecDeque::new(),
        })
    }

    fn fetch(&mut self) -> Option<Result<RawRecord, IngestError>> {
        for record in self.records.by_ref() {
            match record {
                Ok(record) => {
                    let fields: HashMap<String, String> = self
                        .headers
                        .iter()
                        .zip(record.iter())
                        .map(|(header, value)| (header.clone(), value.to_string()))
                        .collect();
                    return Some(Ok(RawRecord::new(fields)));
                }
                Err(e) => return Some(Err(IngestError::from(e))),
            }
        }
        None
    }
}

impl<R: Read> RowReader for CsvRowReader<R> {
    fn available(&mut self) -> bool {
        if !self.lookahead.is_empty() {
            return true;
        }
        match self.fetch() {
            Some(Ok(row)) => {
                self.lookahead.push_back(row);
                true
            }
            // per-record recovery: a row the tokenizer cannot read is logged
            // and dropped, it must not abort the ingestion
            Some(Err(e)) => {
                log::warn!("Dropping unreadable feed row: {e}");
                self.available()
            }
            None => false,
        }
    }

    fn next_row(&mut self) -> Result<RawRecord, IngestError> {
        if let Some(row) = self.lookahead.pop_front() {
            return Ok(row);
        }
        match self.fetch() {
            Some(result) => result,
            None => Err(IngestError::InvalidDataError(
                "Read past the end of a feed file".to_string(),
            )),
        }
    }

    fn unread_row(&mut self, row: RawRecord) {
        self.lookahead.push_front(row);
    }
}

/// all consecutive stop-time (or shape-point) rows sharing one group key.
/// feed files are sorted by their parent entity, so one pass with a single
/// row of push-back recovers the grouping.
#[derive(Debug)]
pub struct TripGroup {
    pub group_id: String,
    pub rows: Vec<RawRecord>,
}

/// reads the next run of rows sharing `key_field`, pushing the first row of
/// the following group back onto the reader. returns None once the file is
/// exhausted.
pub fn read_trip_group<R: RowReader + ?Sized>(
    reader: &mut R,
    key_field: &'static str,
) -> Result<Option<TripGroup>, IngestError> {
    if !reader.available() {
        return Ok(None);
    }
    let first = reader.next_row()?;
    let group_id = first.get(key_field)?.to_string();
    let mut rows = vec![first];

    while reader.available() {
        let row = reader.next_row()?;
        if row.get(key_field)? != group_id {
            reader.unread_row(row);
            break;
        }
        rows.push(row);
    }

    Ok(Some(TripGroup { group_id, rows }))
}
