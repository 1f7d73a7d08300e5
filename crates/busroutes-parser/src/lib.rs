pub mod errors;
pub mod reader;

pub use errors::ParserError;
pub use reader::{parse_route_csv, read_header, CsvOptions};
