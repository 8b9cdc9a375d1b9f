pub mod book;
pub mod import;
pub mod job;
pub mod page;
pub mod response;
pub mod stats;
