//! Candidate retention for keypoint detection.

pub(crate) mod topk;
