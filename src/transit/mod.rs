//! Transit arrivals
//!
//! - ArrivalSource: raw arrivals for one direction of one stop
//! - ArrivalFetcher: reduces raw arrivals to the four-slot display record

pub mod fetcher;
pub mod source;

pub use fetcher::{ArrivalFetcher, FetchSettings, build_record, minutes_until};
pub use source::{ArrivalSource, HttpArrivalSource, parse_stop_response};
