pub mod pipeline;
pub mod sequence;
