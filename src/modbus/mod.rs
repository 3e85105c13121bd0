pub mod frame;
pub mod sync;

pub use frame::FunctionCode;
pub use sync::{find_frame, Expect, FrameDecoder};
