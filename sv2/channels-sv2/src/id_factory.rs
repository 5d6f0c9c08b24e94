/// Generator of unique ids for channels and groups of a connection.
///
/// The counter is incremented before every id is returned, so `0` is never handed out.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct IdFactory {
    state: u32,
}

impl IdFactory {
    pub fn new() -> Self {
        Self { state: 0 }
    }

    /// Increments then returns the internal state.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u32 {
        self.state += 1;
        self.state
    }
}
