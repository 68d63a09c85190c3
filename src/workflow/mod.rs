// Workflow orchestration module - LangGraph-inspired state management
pub mod state;
pub mod graph;
pub mod checkpoint;
pub mod executor;
pub mod router;
pub mod quote_video;
pub mod chat;
