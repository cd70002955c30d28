// State management module
// Handles the shared handles every request and connection works with

pub mod app_state;

pub use app_state::AppState;
