mod app;

pub use app::start_cozy_markers;
