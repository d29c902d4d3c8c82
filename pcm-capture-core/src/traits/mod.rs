pub mod capture_delegate;
pub mod frame_sink;
pub mod frame_source;
