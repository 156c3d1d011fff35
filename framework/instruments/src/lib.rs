mod encoder;
mod record;
mod sink;

pub use encoder::{JsonRecordEncoder, RecordEncoder};
pub use record::ResultRecord;
pub use sink::{result_file_name, ResultSink};
