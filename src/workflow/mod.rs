pub mod discovery;
pub mod flows;
pub mod processors;
pub mod types;
