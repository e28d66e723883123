//! Built-in tools, one per loop category

mod headlines;
mod persist;
mod prices;
mod sentiment;

pub use headlines::FetchHeadlinesTool;
pub use persist::SaveAnalysisTool;
pub use prices::FetchPriceHistoryTool;
pub use sentiment::AnalyzeSentimentTool;
