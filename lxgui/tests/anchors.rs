use cgmath::vec2;
use quickcheck_macros::quickcheck;

use lxgui::{prelude::*, Error};

mod common;
use common::{new_manager, placed_frame};

#[test]
fn top_left_and_size() {
    let manager = new_manager();
    let frame = placed_frame(&manager, "Box", [10.0, 10.0], [50.0, 30.0]);

    assert!(frame.is_ready());
    assert_eq!(frame.borders(), Bounds2::new(10.0, 60.0, 10.0, 40.0));
    assert_eq!(frame.apparent_dimensions(), vec2(50.0, 30.0));
    assert!(!frame.borders_need_update());
}

#[quickcheck]
fn top_left_and_size_any(x: i16, y: i16, w: u8, h: u8) -> bool {
    if w == 0 || h == 0 {
        return true;
    }
    let manager = new_manager();
    let (x, y, w, h) = (x as f32, y as f32, w as f32, h as f32);
    let frame = placed_frame(&manager, "Box", [x, y], [w, h]);

    frame.is_ready() && frame.borders() == Bounds2::new(x, x + w, y, y + h)
}

#[test]
fn opposite_anchors_define_extent() {
    let manager = new_manager();
    let parent = placed_frame(&manager, "Panel", [0.0, 0.0], [400.0, 300.0]);
    let child = parent
        .create_child(ObjectAttributes::frame("$parentInset"))
        .unwrap();
    assert_eq!(child.name(), "PanelInset");

    child.set_point(AnchorData::to_parent(AnchorPoint::TopLeft).with_offset(10.0, 20.0));
    child.set_point(AnchorData::to_parent(AnchorPoint::BottomRight).with_offset(-10.0, -20.0));

    assert!(child.is_apparent_width_defined());
    assert!(child.is_apparent_height_defined());
    assert_eq!(child.borders(), Bounds2::new(10.0, 390.0, 20.0, 280.0));
    assert_eq!(child.dimensions(), vec2(0.0, 0.0));
    assert_eq!(child.apparent_dimensions(), vec2(380.0, 260.0));
}

#[test]
fn center_anchor_uses_size() {
    let manager = new_manager();
    let parent = placed_frame(&manager, "Panel", [100.0, 100.0], [200.0, 200.0]);
    let child = parent
        .create_child(ObjectAttributes::frame("Knob"))
        .unwrap();
    child.set_point(AnchorData::to_parent(AnchorPoint::Center));
    child.set_dimensions(vec2(20.0, 10.0));

    assert_eq!(child.borders(), Bounds2::new(190.0, 210.0, 195.0, 205.0));
    assert_eq!(child.center(), vec2(200.0, 200.0));
}

#[test]
fn edge_and_center_mirror() {
    let manager = new_manager();
    let frame = manager
        .create_root_frame(ObjectAttributes::frame("Bar"))
        .unwrap();
    // The left edge and the vertical center line determine the width
    frame.set_point(AnchorData::new(AnchorPoint::Left, AnchorTarget::Screen, AnchorPoint::TopLeft).with_offset(10.0, 50.0));
    frame.set_point(AnchorData::new(AnchorPoint::Top, AnchorTarget::Screen, AnchorPoint::TopLeft).with_offset(40.0, 30.0));

    let b = frame.borders();
    assert!(frame.is_ready());
    assert_eq!((b.left, b.right), (10.0, 70.0));
    assert_eq!((b.top, b.bottom), (30.0, 70.0));
}

#[test]
fn relative_offset_scales_with_target() {
    let manager = new_manager();
    let parent = placed_frame(&manager, "Panel", [0.0, 0.0], [200.0, 100.0]);
    let child = parent
        .create_child(ObjectAttributes::frame("Mark"))
        .unwrap();
    child.set_point(AnchorData::to_parent(AnchorPoint::TopLeft).with_rel_offset(0.5, 0.5));
    child.set_dimensions(vec2(10.0, 10.0));

    assert_eq!(child.borders(), Bounds2::new(100.0, 110.0, 50.0, 60.0));

    parent.set_dimensions(vec2(400.0, 100.0));
    assert_eq!(child.borders(), Bounds2::new(200.0, 210.0, 50.0, 60.0));
}

#[test]
fn relative_offset_uses_apparent_dimensions() {
    let manager = new_manager();
    // Only the left side is pinned, so the apparent width is the explicit
    // one while the drawn width is snapped to whole pixels
    let target = placed_frame(&manager, "Ruler", [0.0, 0.0], [11.4, 10.0]);
    assert_eq!(target.borders(), Bounds2::new(0.0, 11.0, 0.0, 10.0));
    assert_eq!(target.apparent_dimensions(), vec2(11.4, 10.0));

    let mark = placed_frame(&manager, "Tick", [0.0, 0.0], [5.0, 5.0]);
    mark.set_point(
        AnchorData::new(AnchorPoint::TopLeft, "Ruler", AnchorPoint::TopLeft)
            .with_rel_offset(2.0, 0.0),
    );
    assert_eq!(mark.left(), 23.0);
}

#[test]
fn relative_dimensions() {
    let manager = new_manager();
    let parent = placed_frame(&manager, "Panel", [0.0, 0.0], [200.0, 100.0]);
    let child = parent
        .create_child(ObjectAttributes::frame("Half"))
        .unwrap();
    child.set_relative_dimensions(vec2(0.5, 0.25));
    assert_eq!(child.dimensions(), vec2(100.0, 25.0));

    // Without a parent, the screen is used
    parent.set_relative_width(0.5);
    assert_eq!(parent.dimensions(), vec2(400.0, 100.0));
}

#[test]
fn no_anchor_is_not_ready() {
    let manager = new_manager();
    let frame = manager
        .create_root_frame(ObjectAttributes::frame("Loose"))
        .unwrap();
    frame.set_dimensions(vec2(30.0, 20.0));

    assert!(!frame.is_ready());
    assert_eq!(frame.borders(), Bounds2::new(0.0, 30.0, 0.0, 20.0));
}

#[test]
fn under_determined_axis_is_not_ready() {
    let manager = new_manager();
    let frame = manager
        .create_root_frame(ObjectAttributes::frame("Thin"))
        .unwrap();
    frame.set_point(AnchorData::to_parent(AnchorPoint::TopLeft).with_offset(5.0, 5.0));
    frame.set_width(10.0);

    assert!(!frame.is_ready());
    assert_eq!(frame.borders(), Bounds2::zero());

    frame.set_height(10.0);
    assert!(frame.is_ready());
    assert_eq!(frame.borders(), Bounds2::new(5.0, 15.0, 5.0, 15.0));
}

#[test]
fn unknown_target_falls_back_to_screen() {
    let manager = new_manager();
    let frame = manager
        .create_root_frame(ObjectAttributes::frame("Stray"))
        .unwrap();
    frame.set_point(AnchorData::new(AnchorPoint::TopLeft, "Nowhere", AnchorPoint::TopLeft).with_offset(5.0, 5.0));
    frame.set_dimensions(vec2(10.0, 10.0));

    assert!(frame.is_ready());
    assert_eq!(frame.borders(), Bounds2::new(5.0, 15.0, 5.0, 15.0));
    assert!(frame.anchored_objects().is_empty());
}

#[test]
fn named_target_with_parent_prefix() {
    let manager = new_manager();
    let parent = placed_frame(&manager, "Panel", [0.0, 0.0], [300.0, 300.0]);
    let header = parent
        .create_child(ObjectAttributes::frame("$parentHeader"))
        .unwrap();
    header.set_point(AnchorData::to_parent(AnchorPoint::TopLeft));
    header.set_dimensions(vec2(300.0, 20.0));

    let body = parent
        .create_child(ObjectAttributes::frame("$parentBody"))
        .unwrap();
    body.set_point(AnchorData::new(
        AnchorPoint::TopLeft,
        "$parentHeader",
        AnchorPoint::BottomLeft,
    ));
    body.set_point(AnchorData::to_parent(AnchorPoint::BottomRight));

    assert_eq!(body.borders(), Bounds2::new(0.0, 300.0, 20.0, 300.0));
    assert!(body.depends_on(&header));
    assert_eq!(header.anchored_objects(), vec![body.to_object()]);
}

#[test]
fn cyclic_anchor_is_rejected() {
    let manager = new_manager();
    let a = placed_frame(&manager, "A", [0.0, 0.0], [10.0, 10.0]);
    let b = manager
        .create_root_frame(ObjectAttributes::frame("B"))
        .unwrap();
    b.set_dimensions(vec2(10.0, 10.0));

    a.clear_all_points();
    a.set_point(AnchorData::new(AnchorPoint::TopLeft, "B", AnchorPoint::BottomRight));
    assert_eq!(a.num_points(), 1);
    assert!(a.depends_on(&b));

    b.set_point(AnchorData::new(AnchorPoint::TopLeft, "A", AnchorPoint::TopLeft));
    assert_eq!(b.num_points(), 0);
    assert!(!b.depends_on(&a));
    assert!(!b.defined_borders().left);

    // Anchoring to oneself is a cycle too
    a.set_point(AnchorData::new(AnchorPoint::Right, "A", AnchorPoint::Left));
    assert_eq!(a.point(AnchorPoint::Right), None);
    assert_eq!(a.num_points(), 1);
}

#[test]
fn indirect_cycle_is_rejected() {
    let manager = new_manager();
    let names = ["C1", "C2", "C3"];
    let frames: Vec<HFrame> = names
        .iter()
        .map(|name| {
            manager
                .create_root_frame(ObjectAttributes::frame(*name))
                .unwrap()
        })
        .collect();

    frames[1].set_point(AnchorData::new(AnchorPoint::TopLeft, "C1", AnchorPoint::TopLeft));
    frames[2].set_point(AnchorData::new(AnchorPoint::TopLeft, "C2", AnchorPoint::TopLeft));
    frames[0].set_point(AnchorData::new(AnchorPoint::TopLeft, "C3", AnchorPoint::TopLeft));

    assert!(frames[2].depends_on(&frames[0]));
    assert_eq!(frames[0].num_points(), 0);
}

#[test]
fn dependents_are_invalidated() {
    let manager = new_manager();
    let a = placed_frame(&manager, "A", [0.0, 0.0], [100.0, 100.0]);
    let b = manager
        .create_root_frame(ObjectAttributes::frame("B"))
        .unwrap();
    b.set_point(AnchorData::new(AnchorPoint::TopLeft, "A", AnchorPoint::BottomRight));
    b.set_dimensions(vec2(10.0, 10.0));

    assert_eq!(b.borders(), Bounds2::new(100.0, 110.0, 100.0, 110.0));
    assert!(!a.borders_need_update());

    a.set_dimensions(vec2(200.0, 200.0));
    assert!(a.borders_need_update());
    assert!(b.borders_need_update());
    assert_eq!(b.borders(), Bounds2::new(200.0, 210.0, 200.0, 210.0));
}

#[test]
fn invalidation_reaches_indirect_dependents() {
    let manager = new_manager();
    let a = placed_frame(&manager, "A", [0.0, 0.0], [100.0, 100.0]);
    let b = placed_frame(&manager, "B", [0.0, 0.0], [20.0, 20.0]);
    b.set_point(AnchorData::new(AnchorPoint::TopLeft, "A", AnchorPoint::BottomRight));
    let c = placed_frame(&manager, "C", [0.0, 0.0], [5.0, 5.0]);
    c.set_point(AnchorData::new(AnchorPoint::TopLeft, "B", AnchorPoint::BottomRight));

    assert_eq!(c.borders(), Bounds2::new(120.0, 125.0, 120.0, 125.0));
    assert!(!b.borders_need_update());
    assert!(!c.borders_need_update());

    a.notify_borders_need_update();
    assert!(b.borders_need_update());
    assert!(c.borders_need_update());
    assert_eq!(c.borders(), Bounds2::new(120.0, 125.0, 120.0, 125.0));

    a.set_point(AnchorData::to_parent(AnchorPoint::TopLeft).with_offset(30.0, 10.0));
    assert!(c.borders_need_update());
    assert_eq!(c.borders(), Bounds2::new(150.0, 155.0, 130.0, 135.0));
    assert!(!b.borders_need_update());
}

#[test]
fn not_ready_target_makes_dependent_not_ready() {
    let manager = new_manager();
    let a = manager
        .create_root_frame(ObjectAttributes::frame("A"))
        .unwrap();
    a.set_point(AnchorData::to_parent(AnchorPoint::TopLeft));
    let b = manager
        .create_root_frame(ObjectAttributes::frame("B"))
        .unwrap();
    b.set_all_points("A");

    assert!(!a.is_ready());
    assert!(!b.is_ready());

    a.set_dimensions(vec2(40.0, 40.0));
    assert!(b.is_ready());
    assert_eq!(b.borders(), Bounds2::new(0.0, 40.0, 0.0, 40.0));
}

#[test]
fn destroyed_target_freezes_anchors() {
    let manager = new_manager();
    let a = placed_frame(&manager, "A", [50.0, 40.0], [100.0, 100.0]);
    let b = manager
        .create_root_frame(ObjectAttributes::frame("B"))
        .unwrap();
    b.set_point(
        AnchorData::new(AnchorPoint::TopLeft, "A", AnchorPoint::BottomRight).with_offset(5.0, 5.0),
    );
    b.set_dimensions(vec2(10.0, 10.0));
    let before = b.borders();
    assert_eq!(before, Bounds2::new(155.0, 165.0, 145.0, 155.0));

    a.destroy();
    assert!(a.is_destroyed());
    assert!(manager.object_by_name("A").is_none());

    let anchor = b.point(AnchorPoint::TopLeft).unwrap();
    assert_eq!(anchor.target, AnchorTarget::Screen);
    assert_eq!(anchor.parent_point, AnchorPoint::TopLeft);
    assert_eq!(anchor.offset, AnchorOffset::Abs(vec2(155.0, 145.0)));
    assert_eq!(b.borders(), before);
    assert!(b.is_ready());

    // A second call has no effect
    a.destroy();
}

#[test]
fn set_all_points_and_clear() {
    let manager = new_manager();
    let parent = placed_frame(&manager, "Panel", [10.0, 10.0], [100.0, 50.0]);
    let child = parent
        .create_child(ObjectAttributes::frame("Fill"))
        .unwrap();
    child.set_all_points(AnchorTarget::Parent);

    assert_eq!(child.num_points(), 2);
    assert_eq!(child.defined_borders(), Bounds2::all());
    assert_eq!(child.borders(), parent.borders());

    // Refusing to cover itself keeps the old anchors
    child.set_all_points("Fill");
    assert_eq!(child.num_points(), 2);

    child.clear_all_points();
    assert_eq!(child.num_points(), 0);
    assert_eq!(child.defined_borders(), Bounds2::none());
    assert!(!child.is_ready());
}

#[test]
fn modify_point_in_place() {
    let manager = new_manager();
    let frame = placed_frame(&manager, "Box", [10.0, 10.0], [20.0, 20.0]);

    frame
        .modify_point(AnchorPoint::TopLeft, |data| {
            data.offset = AnchorOffset::Abs(vec2(30.0, 40.0));
        })
        .unwrap();
    assert_eq!(frame.borders(), Bounds2::new(30.0, 50.0, 40.0, 60.0));

    // The anchor can move to another slot
    frame
        .modify_point(AnchorPoint::TopLeft, |data| {
            data.point = AnchorPoint::BottomRight;
            data.parent_point = AnchorPoint::BottomRight;
            data.offset = AnchorOffset::default();
        })
        .unwrap();
    assert_eq!(frame.point(AnchorPoint::TopLeft), None);
    assert_eq!(frame.borders(), Bounds2::new(780.0, 800.0, 580.0, 600.0));

    assert_eq!(
        frame.modify_point(AnchorPoint::Center, |_| {}),
        Err(Error::NoSuchPoint("Box".to_owned()))
    );
}

#[test]
fn offsets_snap_to_device_pixels() {
    common::init_logger();
    let manager = Manager::new(ManagerConfig {
        interface_scaling_factor: 2.0,
        ..ManagerConfig::default()
    });
    let frame = placed_frame(&manager, "Snapped", [10.3, 0.0], [10.2, 10.0]);
    assert_eq!(frame.borders(), Bounds2::new(10.5, 20.5, 0.0, 10.0));

    // A tiny offset never collapses to zero, and snaps to at least one
    // UI unit even when a device pixel is smaller
    let tiny = placed_frame(&manager, "Tiny", [0.1, -0.2], [1.0, 1.0]);
    assert_eq!(tiny.left(), 1.0);
    assert_eq!(tiny.top(), -1.0);

    // The screen is 400x300 UI units at this scale
    let corner = manager
        .create_root_frame(ObjectAttributes::frame("Corner"))
        .unwrap();
    corner.set_point(AnchorData::to_parent(AnchorPoint::BottomRight));
    corner.set_dimensions(vec2(10.0, 10.0));
    assert_eq!(corner.borders(), Bounds2::new(390.0, 400.0, 290.0, 300.0));

    manager.set_interface_scaling_factor(1.0);
    assert!(corner.borders_need_update());
    assert_eq!(corner.borders(), Bounds2::new(790.0, 800.0, 590.0, 600.0));
}

#[test]
fn dimension_limits() {
    let manager = new_manager();
    let frame = placed_frame(&manager, "Limited", [0.0, 0.0], [10.0, 10.0]);

    frame.set_min_dimensions(vec2(50.0, 20.0));
    assert_eq!(frame.dimensions(), vec2(50.0, 20.0));

    frame.set_max_width(60.0);
    frame.set_width(100.0);
    assert_eq!(frame.dimensions().x, 60.0);

    frame.set_max_width(-1.0);
    assert!(frame.max_dimensions().x.is_infinite());

    // Limits also apply to extents pinned on both sides
    frame.set_point(
        AnchorData::new(AnchorPoint::BottomRight, AnchorTarget::Screen, AnchorPoint::TopLeft)
            .with_offset(30.0, 30.0),
    );
    assert_eq!(frame.borders(), Bounds2::new(0.0, 50.0, 0.0, 30.0));
}

#[test]
fn clamped_to_screen() {
    let manager = new_manager();
    let frame = placed_frame(&manager, "Edge", [780.0, -10.0], [40.0, 40.0]);
    assert_eq!(frame.borders(), Bounds2::new(780.0, 820.0, -10.0, 30.0));

    frame.set_clamped_to_screen(true);
    assert_eq!(frame.borders(), Bounds2::new(760.0, 800.0, 0.0, 40.0));
}
