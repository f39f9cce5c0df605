mod chunks;

pub use chunks::Chunks;
