pub mod image_sequence_backend;
#[cfg(feature = "camera")]
pub mod nokhwa_backend;
pub mod scripted_backend;
