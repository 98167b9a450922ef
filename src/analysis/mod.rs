pub mod category;
pub mod summarize;
