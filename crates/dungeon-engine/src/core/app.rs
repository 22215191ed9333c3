use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by the runtime.
///
/// Each frame runs `update` then `frame_update` with the same context, after
/// which the runtime advances input edge state. No callback runs concurrently
/// with another.
pub trait App {
    /// State mutation: read input, apply tools, drain queued commands.
    fn update(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Draw submission; typically ends with a single [`FrameCtx::render`].
    fn frame_update(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
