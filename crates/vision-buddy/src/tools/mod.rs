//! The tools VisionBuddy offers to the model, besides the document lookup.

mod news;
mod search;
mod today;
mod who;

pub use news::{DEFAULT_FEEDS, MedicalNewsTool, NO_NEWS_NOTICE};
pub use search::{NO_RESULTS_NOTICE, SearchTool};
pub use today::TodayTool;
pub use who::{NO_WHO_INFO_NOTICE, WhoDiseaseInfoTool};
