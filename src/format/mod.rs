//! Classic LZMA container format: properties, parameters, and the stream
//! header.

pub mod header;
pub mod params;
pub mod properties;

pub use header::{
    HEADER_LEN, NO_SIZE, decode_header, encode_header, read_header, read_params, write_header,
};
pub use params::{
    DEFAULT_BUF_SIZE, DEFAULT_DICT_CAP, MAX_DICT_CAP, MIN_DICT_CAP, Parameters, SIZE_UNKNOWN,
};
pub use properties::{MAX_LC, MAX_LP, MAX_PB, Properties};
