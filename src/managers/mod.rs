// Managers Module
//
// Focused manager types the session controller delegates to:
// - EventBroadcaster: Tokio broadcast channel for training events

pub mod broadcast_manager;

pub use broadcast_manager::EventBroadcaster;
