//! The core of a retained-mode GUI driven by layout files and scripts.
//!
//! Widgets are UI objects organized in a tree of frames (containers) and
//! layered regions (textures, font strings). Their geometry is described by
//! anchors and resolved lazily; see [`uicore`] for the details.
//!
//! ```
//! use cgmath::vec2;
//! use lxgui::prelude::*;
//!
//! let manager = Manager::new(ManagerConfig::default());
//! let frame = manager
//!     .create_root_frame(ObjectAttributes::frame("Dialog"))
//!     .unwrap();
//! frame.set_point(AnchorData::to_parent(AnchorPoint::Center));
//! frame.set_dimensions(vec2(200.0, 100.0));
//!
//! assert_eq!(frame.borders(), Bounds2::new(300.0, 500.0, 250.0, 350.0));
//! ```
#![allow(clippy::float_cmp)]
#![allow(clippy::new_without_default)]

mod error;
pub mod uicore;
pub mod utils;

pub use self::error::{Error, ScriptError, ScriptResult};

pub mod prelude {
    #[doc(no_inline)]
    pub use crate::{
        uicore::{
            AnchorData, AnchorOffset, AnchorPoint, AnchorTarget, Bounds2, EventData, FrameStrata,
            HFrame, HObject, HRegion, Layer, Manager, ManagerConfig, ObjectAttributes,
            ObjectType, Value,
        },
        utils::RoundingMethod,
        Error, ScriptResult,
    };
}
