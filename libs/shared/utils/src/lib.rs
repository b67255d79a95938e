pub mod extractor;
pub mod jwt;
pub mod time_format;
pub mod test_utils;
