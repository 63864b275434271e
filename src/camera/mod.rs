pub mod backend;
pub mod replay;

pub use backend::{
    remember_camera, select_camera, CameraConstraints, FacingMode, Frame, MediaSource,
};
pub use replay::{load_frame, StillCamera};
