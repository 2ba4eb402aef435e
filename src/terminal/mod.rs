pub mod color;
pub mod frame;
pub mod raw;
pub mod render;
pub mod suggestion;
pub mod transport;
pub mod width;
