pub mod buffer;
pub mod capabilities;
pub mod convert;
pub mod fps;
pub mod raster;
pub mod renderer;
pub mod sampler;
pub mod texture_stream;
pub mod timer;
pub mod viewport;

pub use buffer::{GrowBuffer, SourceFramebuffer};
pub use capabilities::{has_extension, Capabilities};
pub use convert::{PackOrder, PaddedLayout};
pub use fps::FpsCounter;
pub use raster::{TexelFormat, TexelView};
pub use renderer::{FrameTarget, FramebufferRenderer, PresentStats};
pub use sampler::{Filter, FilterState};
pub use texture_stream::{
    next_pot, required_extent, Extent, SlotAllocator, SlotIndex, SlotRing, TextureStream,
};
pub use timer::{EveryNTicks, SyncThrottle};
pub use viewport::{TexCoordCache, TexCoords, Viewport};
