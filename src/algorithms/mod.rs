//! Collection of vision primitives shared by the per-frame-pair detectors

pub mod brief;
pub mod corners;
pub mod features;
pub mod homography;
pub mod klt;
pub mod motion;
