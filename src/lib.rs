pub mod column;
pub mod dataset;
pub mod decode;
pub mod dispatch;
pub mod element;
pub mod encoding;
pub mod error;
pub mod logger;
pub mod promote;
pub mod reader;
pub mod scalar;
pub mod sinks;
pub mod vector;

pub use crate::error::{Channel, Error, Result};
pub use column::Column;
pub use dataset::{Dataset, NamedColumn};
pub use decode::{
    ColumnDecoder, ColumnEncoder, ColumnType, DecodeReport, DecodedColumn, MissingToken,
    MissingTokenSpec, MissingTokens, PlainColumn,
};
pub use dispatch::{ReasonProbe, probe};
pub use element::{Cell, Channeled, Reason};
pub use promote::ChannelTypes;
pub use reader::{LoadConfig, LoadOptions, Loaded, read_csv, read_csv_from_reader};
pub use scalar::{Scalar, ScalarType};
pub use sinks::{CsvSink, RowSink, SinkContext, write_dataset, write_loaded};
pub use vector::ChanneledVec;
