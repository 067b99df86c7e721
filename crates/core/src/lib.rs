pub mod capture {
    pub mod domain {
        pub mod capture_device;
        pub mod capture_error;
        pub mod frame_source;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod detection_error;
        pub mod detection_outcome;
        pub mod face_detector;
    }
    pub mod infrastructure;
}

pub mod mapping {
    pub mod domain {
        pub mod coordinate_mapper;
        pub mod preview_geometry;
    }
}

pub mod control {
    pub mod domain {
        pub mod control_bridge;
        pub mod face_indicator;
        pub mod game_state;
        pub mod redraw_guard;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod face_control_pipeline;
    pub mod pipeline_config;
    pub mod pipeline_error;
    pub mod pipeline_logger;
}

pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod geometry;
    pub mod main_queue;
    pub mod orientation;
}
