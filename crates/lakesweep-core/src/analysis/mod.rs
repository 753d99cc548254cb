pub mod forecast;
pub mod reaper;
pub mod threshold;
