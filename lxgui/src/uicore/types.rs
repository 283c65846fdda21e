//! Value types shared by the layout engine and the frame hierarchy.
use cgmath::{vec2, Vector2};
use std::{fmt, str::FromStr};

use crate::Error;

/// One of the nine points of a rectangle an anchor can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorPoint {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    Center,
}

impl AnchorPoint {
    /// All points in slot order.
    pub const ALL: [AnchorPoint; 9] = [
        AnchorPoint::TopLeft,
        AnchorPoint::Top,
        AnchorPoint::TopRight,
        AnchorPoint::Right,
        AnchorPoint::BottomRight,
        AnchorPoint::Bottom,
        AnchorPoint::BottomLeft,
        AnchorPoint::Left,
        AnchorPoint::Center,
    ];

    /// The index of the anchor slot holding this point.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The name used by layout files and scripts.
    pub fn as_str(self) -> &'static str {
        match self {
            AnchorPoint::TopLeft => "TOPLEFT",
            AnchorPoint::Top => "TOP",
            AnchorPoint::TopRight => "TOPRIGHT",
            AnchorPoint::Right => "RIGHT",
            AnchorPoint::BottomRight => "BOTTOMRIGHT",
            AnchorPoint::Bottom => "BOTTOM",
            AnchorPoint::BottomLeft => "BOTTOMLEFT",
            AnchorPoint::Left => "LEFT",
            AnchorPoint::Center => "CENTER",
        }
    }

    /// The fractional position of the point inside a unit square, `(0, 0)`
    /// being the top-left corner.
    pub fn fraction(self) -> Vector2<f32> {
        match self {
            AnchorPoint::TopLeft => vec2(0.0, 0.0),
            AnchorPoint::Top => vec2(0.5, 0.0),
            AnchorPoint::TopRight => vec2(1.0, 0.0),
            AnchorPoint::Right => vec2(1.0, 0.5),
            AnchorPoint::BottomRight => vec2(1.0, 1.0),
            AnchorPoint::Bottom => vec2(0.5, 1.0),
            AnchorPoint::BottomLeft => vec2(0.0, 1.0),
            AnchorPoint::Left => vec2(0.0, 0.5),
            AnchorPoint::Center => vec2(0.5, 0.5),
        }
    }

    /// The offset of the point from the top-left corner of a rectangle of
    /// the given size.
    pub fn offset_in(self, size: Vector2<f32>) -> Vector2<f32> {
        let f = self.fraction();
        vec2(f.x * size.x, f.y * size.y)
    }
}

impl FromStr for AnchorPoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnchorPoint::ALL
            .iter()
            .cloned()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| Error::UnknownAnchorPoint(s.to_owned()))
    }
}

impl fmt::Display for AnchorPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A draw layer of a frame. Regions of a frame are drawn layer by layer, in
/// the declaration order of this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Background,
    Border,
    Artwork,
    Overlay,
    Highlight,
}

impl Layer {
    pub const ALL: [Layer; 5] = [
        Layer::Background,
        Layer::Border,
        Layer::Artwork,
        Layer::Overlay,
        Layer::Highlight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Layer::Background => "BACKGROUND",
            Layer::Border => "BORDER",
            Layer::Artwork => "ARTWORK",
            Layer::Overlay => "OVERLAY",
            Layer::Highlight => "HIGHLIGHT",
        }
    }
}

impl Default for Layer {
    fn default() -> Self {
        Layer::Artwork
    }
}

impl FromStr for Layer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "SPECIALHIGH" is accepted by layout files as an alias.
        if s == "SPECIALHIGH" {
            return Ok(Layer::Highlight);
        }
        Layer::ALL
            .iter()
            .cloned()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| Error::UnknownLayer(s.to_owned()))
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coarse drawing band. Frames in a higher stratum are always drawn above
/// frames in a lower one, regardless of their level.
///
/// `Parent` is a sentinel that is resolved to the parent frame's strata when
/// assigned to a concrete frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FrameStrata {
    Parent,
    Background,
    Low,
    Medium,
    High,
    Dialog,
    Fullscreen,
    FullscreenDialog,
    Tooltip,
}

impl FrameStrata {
    /// The number of concrete strata.
    pub const COUNT: usize = 8;

    /// All concrete strata, from the bottom-most to the top-most.
    pub const ALL: [FrameStrata; 8] = [
        FrameStrata::Background,
        FrameStrata::Low,
        FrameStrata::Medium,
        FrameStrata::High,
        FrameStrata::Dialog,
        FrameStrata::Fullscreen,
        FrameStrata::FullscreenDialog,
        FrameStrata::Tooltip,
    ];

    /// The index of a concrete stratum in `ALL`. Returns `None` for `Parent`.
    pub fn index(self) -> Option<usize> {
        match self {
            FrameStrata::Parent => None,
            x => Some(x as usize - 1),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FrameStrata::Parent => "PARENT",
            FrameStrata::Background => "BACKGROUND",
            FrameStrata::Low => "LOW",
            FrameStrata::Medium => "MEDIUM",
            FrameStrata::High => "HIGH",
            FrameStrata::Dialog => "DIALOG",
            FrameStrata::Fullscreen => "FULLSCREEN",
            FrameStrata::FullscreenDialog => "FULLSCREEN_DIALOG",
            FrameStrata::Tooltip => "TOOLTIP",
        }
    }
}

impl Default for FrameStrata {
    fn default() -> Self {
        FrameStrata::Medium
    }
}

impl FromStr for FrameStrata {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        std::iter::once(FrameStrata::Parent)
            .chain(FrameStrata::ALL.iter().cloned())
            .find(|x| x.as_str() == s)
            .ok_or_else(|| Error::UnknownStrata(s.to_owned()))
    }
}

impl fmt::Display for FrameStrata {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Four values, one per side of a rectangle.
///
/// `Bounds2<f32>` is the border rectangle of an object in screen space (the
/// Y axis points down). `Bounds2<bool>` records which sides were pinned by an
/// anchor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds2<T> {
    pub left: T,
    pub right: T,
    pub top: T,
    pub bottom: T,
}

impl<T> Bounds2<T> {
    pub fn new(left: T, right: T, top: T, bottom: T) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }
}

impl Bounds2<f32> {
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn dimensions(&self) -> Vector2<f32> {
        vec2(self.width(), self.height())
    }

    pub fn top_left(&self) -> Vector2<f32> {
        vec2(self.left, self.top)
    }

    pub fn center(&self) -> Vector2<f32> {
        vec2(
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }

    /// The screen-space position of `point` on this rectangle.
    pub fn point(&self, point: AnchorPoint) -> Vector2<f32> {
        self.top_left() + point.offset_in(self.dimensions())
    }

    /// Check if `p` lies inside the rectangle. The left and top sides are
    /// inclusive, the right and bottom sides are exclusive.
    pub fn contains_point(&self, p: Vector2<f32>) -> bool {
        p.x >= self.left && p.x < self.right && p.y >= self.top && p.y < self.bottom
    }

    /// Shrink the rectangle by `insets` on each side.
    pub fn inset(&self, insets: &Bounds2<f32>) -> Self {
        Self::new(
            self.left + insets.left,
            self.right - insets.right,
            self.top + insets.top,
            self.bottom - insets.bottom,
        )
    }
}

impl Bounds2<bool> {
    pub fn none() -> Self {
        Self::new(false, false, false, false)
    }

    pub fn all() -> Self {
        Self::new(true, true, true, true)
    }
}

/// The concrete class of a UI object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// A container that owns child frames and layered regions.
    Frame,
    /// A plain layered region, also used for title regions.
    Region,
    Texture,
    FontString,
}

impl ObjectType {
    /// The type chain of this class, from the most generic name to the
    /// class's own name.
    pub fn type_chain(self) -> &'static [&'static str] {
        match self {
            ObjectType::Frame => &["UIObject", "Frame"],
            ObjectType::Region => &["UIObject", "LayeredRegion", "Region"],
            ObjectType::Texture => &["UIObject", "LayeredRegion", "Texture"],
            ObjectType::FontString => &["UIObject", "LayeredRegion", "FontString"],
        }
    }

    /// The class's own name.
    pub fn name(self) -> &'static str {
        let chain = self.type_chain();
        chain[chain.len() - 1]
    }

    pub fn is_frame(self) -> bool {
        self == ObjectType::Frame
    }

    pub fn is_layered_region(self) -> bool {
        !self.is_frame()
    }
}

impl Default for ObjectType {
    fn default() -> Self {
        ObjectType::Frame
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_point_names() {
        for &p in AnchorPoint::ALL.iter() {
            assert_eq!(p.to_string().parse::<AnchorPoint>(), Ok(p));
        }
        assert_eq!(
            "MIDDLE".parse::<AnchorPoint>(),
            Err(Error::UnknownAnchorPoint("MIDDLE".to_owned()))
        );
    }

    #[test]
    fn anchor_point_slots_are_distinct() {
        for (i, p) in AnchorPoint::ALL.iter().enumerate() {
            assert_eq!(p.index(), i);
        }
    }

    #[test]
    fn strata_names() {
        assert_eq!("PARENT".parse(), Ok(FrameStrata::Parent));
        assert_eq!(
            "FULLSCREEN_DIALOG".parse(),
            Ok(FrameStrata::FullscreenDialog)
        );
        assert!("SKY".parse::<FrameStrata>().is_err());
        assert_eq!(FrameStrata::Parent.index(), None);
        assert_eq!(FrameStrata::Background.index(), Some(0));
        assert_eq!(FrameStrata::Tooltip.index(), Some(7));
    }

    #[test]
    fn layer_names() {
        assert_eq!("OVERLAY".parse(), Ok(Layer::Overlay));
        assert_eq!("SPECIALHIGH".parse(), Ok(Layer::Highlight));
        assert!("FOREGROUND".parse::<Layer>().is_err());
    }

    #[test]
    fn bounds_points() {
        let b = Bounds2::new(10.0, 60.0, 10.0, 40.0);
        assert_eq!(b.dimensions(), vec2(50.0, 30.0));
        assert_eq!(b.point(AnchorPoint::TopLeft), vec2(10.0, 10.0));
        assert_eq!(b.point(AnchorPoint::Center), vec2(35.0, 25.0));
        assert_eq!(b.point(AnchorPoint::BottomRight), vec2(60.0, 40.0));
        assert!(b.contains_point(vec2(10.0, 39.0)));
        assert!(!b.contains_point(vec2(60.0, 20.0)));
    }

    #[test]
    fn type_chain() {
        assert_eq!(ObjectType::Texture.name(), "Texture");
        assert!(ObjectType::FontString
            .type_chain()
            .contains(&"LayeredRegion"));
        assert!(!ObjectType::Frame.is_layered_region());
    }
}
