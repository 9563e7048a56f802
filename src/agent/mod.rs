pub mod fsm;
mod orchestrator;

pub use orchestrator::Orchestrator;
