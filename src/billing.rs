pub mod interval;
pub mod invoice;
pub mod mode;
pub mod period;
pub mod reading;
pub mod report;
pub mod rollup;
pub mod summary;
pub mod table;
