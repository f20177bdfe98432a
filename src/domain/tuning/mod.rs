pub mod rink;

pub use rink::RinkTuning;
