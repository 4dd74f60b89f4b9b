mod raw_record;
mod row_reader;

pub use raw_record::RawRecord;
pub use row_reader::{read_trip_group, CsvRowReader, RowReader, TripGroup};
