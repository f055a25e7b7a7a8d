//! Infrastructure adapters used by the feature services

pub mod storage;
