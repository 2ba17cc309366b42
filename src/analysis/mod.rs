pub mod ela;
pub mod features;
