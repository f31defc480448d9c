pub mod aggregator;
pub mod enrich;
pub mod resolver;

pub use aggregator::{AggregatedNews, AggregatorConfig, NewsAggregator, PAGE_SIZE};
pub use enrich::SentimentEnricher;
pub use resolver::CompanyNameResolver;

#[cfg(test)]
mod testutil;
