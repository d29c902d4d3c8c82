pub mod metadata;
pub mod spool;
