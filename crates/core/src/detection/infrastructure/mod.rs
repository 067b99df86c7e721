pub mod detection_pool;
pub mod model_resolver;
pub mod rustface_detector;
