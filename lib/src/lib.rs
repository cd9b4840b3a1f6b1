mod codec;
mod decimate;
pub mod lttb;
mod query;
mod reading;

pub use codec::*;
pub use decimate::*;
pub use lttb::{downsample, DownsampleError, Sample};
pub use query::*;
pub use reading::*;
