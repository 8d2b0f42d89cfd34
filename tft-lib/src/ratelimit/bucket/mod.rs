#![allow(clippy::module_inception)]

mod bucket;
mod name;
mod status;

pub(crate) use bucket::Bucket;
pub use name::BucketName;
pub use status::{BucketStatus, BucketStatusMap};
