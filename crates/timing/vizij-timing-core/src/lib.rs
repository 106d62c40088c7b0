//! Vizij Timing Core (engine-agnostic)
//!
//! Retained-mode timing and value composition. Author-time [`Timeline`]s are
//! realized into runtime clock trees; each frame the [`Engine`] samples every
//! clock against one global time, reshapes progress through easing curves and
//! key splines, composes per-property animation chains and pushes the results
//! to the rendering channel at most once per target per frame.

pub mod clock;
pub mod compose;
pub mod config;
pub mod curve;
pub mod engine;
pub mod error;
pub mod ids;
pub mod outputs;
pub mod timeline;
pub mod value;
pub mod weak;

// Re-exports for consumers (hosts)
pub use clock::{Clock, ClockSample, ClockState, ClockTree, PostfixSubtree, PrefixSubtree};
pub use compose::{
    resolve_chain, Animatable, AnimationLayer, AnimationOutput, AnimationStorage, FrameBatch,
    FrameQueue, Invalidation, LocalChannel, ResolvedChain, ResolvedLink, ResourceChannel,
    ResourceKey, ValueAnimation,
};
pub use config::Config;
pub use curve::{Easing, EasingFunction, EasingMode, KeySpline, Point};
pub use engine::Engine;
pub use error::{Result, TimingError};
pub use ids::{AnimatableId, ClockId, PropertyId, PropertyRegistry, ResourceHandle, TimelineId};
pub use outputs::{Change, Outputs};
pub use timeline::{
    FillBehavior, RepeatBehavior, Timeline, TimelineCollection, TimelineDuration,
    TimelineEnumerator, TimelineKind, TimelineTree, TimelineWalker, Timing,
};
pub use value::{Value, ValueKind};
pub use weak::{ArenaLiveness, WeakHandle, WeakHandleEnumerator, WeakList};
