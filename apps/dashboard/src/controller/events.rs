//! Events delivered from the store to the render loop.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    /// The store merged a patch; re-render from `get_state()`.
    StateChanged,
    Shutdown,
}
