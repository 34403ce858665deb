pub mod cite;
pub mod common;
pub mod corpus;
pub mod engine;
pub mod pipeline;
