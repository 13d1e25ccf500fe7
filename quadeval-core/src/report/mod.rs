pub mod evaluate;
pub mod loader;
pub mod record;
pub mod stats;
