//! Control-plane adapters.
//!
//! - `HttpControlPlane` - panel API over HTTPS (reqwest)
//! - `MockControlPlane` - in-process double for tests

mod http_control_plane;
mod mock_control_plane;

pub use http_control_plane::{ControlPlaneConfig, HttpControlPlane};
pub use mock_control_plane::MockControlPlane;
