pub mod bioboxes;
pub mod compare;
pub mod config;
pub mod convert;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod gold;
pub mod output;
pub mod pca;
pub mod profile;
pub mod profiler;
pub mod taxonomy;
pub mod taxpasta;
pub mod validation;
