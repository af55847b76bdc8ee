use render::GroupHandle;

/// A named overlay whose features live in one engine group.
pub trait Layer {
    fn name(&self) -> &str;
    fn group(&self) -> GroupHandle;
    /// Number of rendered feature handles.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
