pub mod etl;
pub mod flatten;
pub mod merge;
pub mod normalize;
pub mod pipeline;

pub use crate::domain::model::{AggregateTable, Normalized, NormalizeMeta, Table};
pub use crate::domain::ports::{
    ConfigProvider, FieldExtractor, PageScraper, Pipeline, Storage, UrlExtractor,
};
pub use crate::utils::error::Result;
