mod adapter;
mod native;

pub use adapter::CaptureEngineAdapter;
pub use native::{
    translate, NativeCaptureEngine, NativeCaptureHandle, NativeCaptureState, NativeCaptureUpdate,
    NativeStatusCallback,
};
