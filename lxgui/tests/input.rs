use cgmath::vec2;

use lxgui::prelude::*;

mod common;
use common::{new_manager, placed_frame, Log};

/// Log every call of the scripts `names` as `"<frame>:<script><args>"`.
fn log_scripts(frame: &HFrame, log: &Log, names: &[&'static str]) {
    for &name in names {
        let log = log.clone();
        frame.define_script(
            name,
            move |this, data| {
                log.push(format!("{}:{}{}", this.name(), name, data));
                Ok(())
            },
            true,
        );
    }
}

const FOCUS_SCRIPTS: &[&str] = &["OnFocusGained", "OnFocusLost"];

#[test]
fn focus_stack_notifies_changes() {
    let manager = new_manager();
    let log = Log::default();
    let a = placed_frame(&manager, "A", [0.0, 0.0], [10.0, 10.0]);
    let b = placed_frame(&manager, "B", [0.0, 0.0], [10.0, 10.0]);
    log_scripts(&a, &log, FOCUS_SCRIPTS);
    log_scripts(&b, &log, FOCUS_SCRIPTS);

    a.set_focus(true);
    assert_eq!(log.take(), vec!["A:OnFocusGained()"]);
    assert!(a.has_focus());

    // Requesting again keeps the focus without notifications
    a.set_focus(true);
    assert!(log.take().is_empty());

    b.set_focus(true);
    assert_eq!(log.take(), vec!["A:OnFocusLost()", "B:OnFocusGained()"]);
    assert_eq!(manager.focused_frame(), Some(b.clone()));
    assert!(!a.has_focus());

    // Releasing gives the focus back to the frame below
    b.set_focus(false);
    assert_eq!(log.take(), vec!["B:OnFocusLost()", "A:OnFocusGained()"]);
    assert_eq!(manager.focused_frame(), Some(a.clone()));

    // Releasing a frame below the top changes nothing visible
    b.set_focus(true);
    log.take();
    a.set_focus(false);
    assert!(log.take().is_empty());
    assert_eq!(manager.focused_frame(), Some(b.clone()));

    manager.clear_focus();
    assert_eq!(log.take(), vec!["B:OnFocusLost()"]);
    assert_eq!(manager.focused_frame(), None);
}

#[test]
fn hiding_or_destroying_releases_focus() {
    let manager = new_manager();
    let log = Log::default();
    let a = placed_frame(&manager, "A", [0.0, 0.0], [10.0, 10.0]);
    let b = placed_frame(&manager, "B", [0.0, 0.0], [10.0, 10.0]);
    let child = b
        .create_child(ObjectAttributes::frame("$parentChild"))
        .unwrap();
    log_scripts(&a, &log, FOCUS_SCRIPTS);
    log_scripts(&child, &log, FOCUS_SCRIPTS);

    a.set_focus(true);
    child.set_focus(true);
    log.take();

    // Hiding an ancestor hides the focused frame
    b.hide();
    assert_eq!(log.take(), vec!["BChild:OnFocusLost()", "A:OnFocusGained()"]);

    b.show();
    child.set_focus(true);
    log.take();
    b.destroy();
    assert_eq!(log.take(), vec!["BChild:OnFocusLost()", "A:OnFocusGained()"]);
    assert_eq!(manager.focused_frame(), Some(a));
}

#[test]
fn auto_focus_on_show() {
    let manager = new_manager();
    let frame = placed_frame(&manager, "EditBox", [0.0, 0.0], [10.0, 10.0]);
    frame.enable_auto_focus(true);
    assert!(!frame.has_focus());

    frame.hide();
    frame.show();
    assert!(frame.has_focus());

    frame.hide();
    assert!(!frame.has_focus());
    assert_eq!(manager.focused_frame(), None);
}

#[test]
fn hover_fires_enter_and_leave() {
    let manager = new_manager();
    let log = Log::default();
    let low = placed_frame(&manager, "Low", [0.0, 0.0], [100.0, 100.0]);
    let high = placed_frame(&manager, "High", [50.0, 50.0], [100.0, 100.0]);
    high.set_frame_strata(FrameStrata::High);
    for frame in [&low, &high].iter() {
        frame.enable_mouse(true);
        log_scripts(frame, &log, &["OnEnter", "OnLeave"]);
    }

    assert!(manager.on_mouse_moved(vec2(10.0, 10.0)));
    assert_eq!(log.take(), vec!["Low:OnEnter(10, 10)"]);
    assert!(low.is_mouse_in_frame());

    assert!(manager.on_mouse_moved(vec2(20.0, 10.0)));
    assert!(log.take().is_empty());

    manager.on_mouse_moved(vec2(75.0, 75.0));
    assert_eq!(log.take(), vec!["Low:OnLeave()", "High:OnEnter(75, 75)"]);
    assert_eq!(manager.hovered_frame(), Some(high.clone()));

    // Frames ignoring mouse movement are skipped
    high.enable_mouse_move(false);
    manager.on_mouse_moved(vec2(76.0, 75.0));
    assert_eq!(log.take(), vec!["High:OnLeave()", "Low:OnEnter(76, 75)"]);

    assert!(!manager.on_mouse_moved(vec2(500.0, 500.0)));
    assert_eq!(log.take(), vec!["Low:OnLeave()"]);
    assert_eq!(manager.hovered_frame(), None);

    manager.on_mouse_moved(vec2(10.0, 10.0));
    low.destroy();
    assert_eq!(manager.hovered_frame(), None);
}

#[test]
fn mouse_buttons_reach_topmost_clickable_frame() {
    let manager = new_manager();
    let log = Log::default();
    let back = placed_frame(&manager, "Back", [0.0, 0.0], [100.0, 100.0]);
    let front = placed_frame(&manager, "Front", [0.0, 0.0], [50.0, 50.0]);
    front.set_level(3);
    back.enable_mouse_click(true);
    back.set_top_level(true);
    log_scripts(&back, &log, &["OnMouseDown", "OnMouseUp", "OnDoubleClick"]);
    log_scripts(&front, &log, &["OnMouseDown"]);

    // Front does not accept clicks, so Back receives them
    manager.on_mouse_moved(vec2(10.0, 20.0));
    assert!(manager.on_mouse_button("LeftButton", true, false));
    assert!(manager.on_mouse_button("LeftButton", false, false));
    assert!(manager.on_mouse_button("LeftButton", true, true));
    assert_eq!(
        log.take(),
        vec![
            "Back:OnMouseDown(LeftButton, 10, 20)",
            "Back:OnMouseUp(LeftButton, 10, 20)",
            "Back:OnDoubleClick(LeftButton, 10, 20)",
        ]
    );

    // A press raises the top-level parent
    assert_eq!(back.level(), 4);

    manager.on_mouse_moved(vec2(300.0, 300.0));
    assert!(!manager.on_mouse_button("LeftButton", true, false));
    assert!(log.take().is_empty());
}

#[test]
fn press_elsewhere_clears_focus() {
    let manager = new_manager();
    let edit = placed_frame(&manager, "Edit", [0.0, 0.0], [100.0, 20.0]);
    let other = placed_frame(&manager, "Other", [0.0, 50.0], [100.0, 20.0]);
    edit.enable_mouse_click(true);
    other.enable_mouse_click(true);
    edit.set_focus(true);

    // Pressing the focused frame keeps the focus
    manager.on_mouse_moved(vec2(10.0, 10.0));
    manager.on_mouse_button("LeftButton", true, false);
    assert!(edit.has_focus());

    // Double clicks never clear it
    manager.on_mouse_moved(vec2(10.0, 60.0));
    manager.on_mouse_button("LeftButton", true, true);
    assert!(edit.has_focus());

    manager.on_mouse_button("LeftButton", true, false);
    assert!(!edit.has_focus());
    assert_eq!(manager.focused_frame(), None);
}

#[test]
fn wheel_reaches_wheel_enabled_frame() {
    let manager = new_manager();
    let log = Log::default();
    let list = placed_frame(&manager, "List", [0.0, 0.0], [100.0, 100.0]);
    let button = placed_frame(&manager, "Button", [0.0, 0.0], [20.0, 20.0]);
    button.set_level(5);
    button.enable_mouse(true);
    list.enable_mouse_wheel(true);
    log_scripts(&list, &log, &["OnMouseWheel"]);

    manager.on_mouse_moved(vec2(10.0, 10.0));
    assert!(manager.on_mouse_wheel(-1.5));
    assert_eq!(log.take(), vec!["List:OnMouseWheel(-1.5, 10, 10)"]);

    list.enable_mouse_wheel(false);
    assert!(!manager.on_mouse_wheel(1.0));
    assert!(log.take().is_empty());
}

#[test]
fn drag_and_drop() {
    let manager = new_manager();
    let log = Log::default();
    let source = placed_frame(&manager, "Source", [0.0, 0.0], [50.0, 50.0]);
    let target = placed_frame(&manager, "Target", [100.0, 0.0], [50.0, 50.0]);
    for frame in [&source, &target].iter() {
        frame.enable_mouse(true);
        frame.register_for_drag(&["LeftButton"]);
        log_scripts(frame, &log, &["OnDragStart", "OnDragStop", "OnReceiveDrag"]);
    }

    // Not registered for this button
    manager.on_mouse_moved(vec2(10.0, 10.0));
    assert!(manager.on_drag_start("RightButton"));
    assert!(log.take().is_empty());
    assert_eq!(manager.dragged_frame(), None);

    assert!(manager.on_drag_start("LeftButton"));
    assert_eq!(log.take(), vec!["Source:OnDragStart(LeftButton, 10, 10)"]);
    assert_eq!(manager.dragged_frame(), Some(source.clone()));

    manager.on_mouse_moved(vec2(120.0, 30.0));
    assert!(manager.on_drag_stop("LeftButton"));
    assert_eq!(
        log.take(),
        vec![
            "Source:OnDragStop()",
            "Target:OnReceiveDrag(LeftButton, 120, 30)",
        ]
    );
    assert_eq!(manager.dragged_frame(), None);
}

#[test]
fn keys_go_to_focus_then_to_capturing_frames() {
    let manager = new_manager();
    let log = Log::default();
    let menu = placed_frame(&manager, "Menu", [0.0, 0.0], [10.0, 10.0]);
    let edit = placed_frame(&manager, "Edit", [0.0, 0.0], [10.0, 10.0]);
    menu.enable_key_capture("ESCAPE", true);
    for frame in [&menu, &edit].iter() {
        log_scripts(frame, &log, &["OnKeyDown", "OnKeyUp", "OnChar"]);
    }

    assert!(manager.on_key("ESCAPE", true));
    assert!(manager.on_key("ESCAPE", false));
    assert!(!manager.on_key("Ctrl-A", true));
    assert!(!manager.on_char('a'));
    assert_eq!(
        log.take(),
        vec!["Menu:OnKeyDown(ESCAPE)", "Menu:OnKeyUp(ESCAPE)"]
    );

    edit.set_focus(true);
    assert!(manager.on_key("ESCAPE", true));
    assert!(manager.on_char('é'));
    assert_eq!(
        log.take(),
        vec!["Edit:OnKeyDown(ESCAPE)", "Edit:OnChar(é, 233)"]
    );

    menu.enable_key_capture("ESCAPE", false);
    edit.set_focus(false);
    assert!(!manager.on_key("ESCAPE", true));
}

#[test]
fn relative_hit_rect_insets() {
    let manager = new_manager();
    let frame = placed_frame(&manager, "Slider", [0.0, 0.0], [100.0, 50.0]);
    frame.set_rel_hit_rect_insets(Bounds2::new(0.1, 0.0, 0.2, 0.0));
    assert_eq!(frame.rel_hit_rect_insets(), Bounds2::new(0.1, 0.0, 0.2, 0.0));

    assert!(!frame.is_in_region(vec2(5.0, 20.0)));
    assert!(frame.is_in_region(vec2(15.0, 20.0)));
    assert!(!frame.is_in_region(vec2(15.0, 5.0)));

    // Added to the absolute insets
    frame.set_abs_hit_rect_insets(Bounds2::new(5.0, 0.0, 0.0, 0.0));
    assert!(!frame.is_in_region(vec2(12.0, 20.0)));
    assert!(frame.is_in_region(vec2(16.0, 20.0)));
}

#[test]
fn title_region_drag_moves_frame() {
    let manager = new_manager();
    let window = placed_frame(&manager, "Window", [100.0, 100.0], [50.0, 50.0]);
    window.enable_mouse(true);
    let title = window.create_title_region().unwrap();
    title.set_point(AnchorData::to_parent(AnchorPoint::TopLeft));
    title.set_point(AnchorData::to_parent(AnchorPoint::TopRight));
    title.set_height(10.0);

    // Not movable yet
    manager.on_mouse_moved(vec2(110.0, 105.0));
    manager.on_drag_start("LeftButton");
    assert!(!manager.is_moving(&window));

    window.set_movable(true);
    manager.on_drag_start("LeftButton");
    assert!(manager.is_moving(&window));
    assert!(window.is_user_placed());

    manager.on_mouse_moved(vec2(130.0, 95.0));
    assert_eq!(window.borders(), Bounds2::new(120.0, 170.0, 90.0, 140.0));

    manager.on_drag_stop("LeftButton");
    assert!(!manager.is_moving(&window));
    manager.on_mouse_moved(vec2(200.0, 200.0));
    assert_eq!(window.left(), 120.0);
}

#[test]
fn sizing_keeps_opposite_point() {
    let manager = new_manager();
    let frame = placed_frame(&manager, "Panel", [10.0, 10.0], [100.0, 50.0]);
    manager.on_mouse_moved(vec2(110.0, 60.0));

    manager.start_sizing(&frame, AnchorPoint::BottomRight);
    assert!(!manager.is_sizing(&frame));

    frame.set_resizable(true);
    manager.start_sizing(&frame, AnchorPoint::BottomRight);
    assert!(manager.is_sizing(&frame));
    manager.on_mouse_moved(vec2(130.0, 50.0));
    assert_eq!(frame.borders(), Bounds2::new(10.0, 130.0, 10.0, 50.0));

    // A side only resizes one axis
    manager.start_sizing(&frame, AnchorPoint::Left);
    manager.on_mouse_moved(vec2(140.0, 0.0));
    assert_eq!(frame.borders(), Bounds2::new(20.0, 130.0, 10.0, 50.0));

    manager.stop_sizing();
    assert!(!manager.is_sizing(&frame));
}

#[test]
fn templates_pass_on_interaction_state() {
    let manager = new_manager();
    let template = manager
        .create_root_frame(ObjectAttributes::frame("DraggableTemplate").virtual_())
        .unwrap();
    template.enable_mouse(true);
    template.set_movable(true);
    template.register_for_drag(&["LeftButton"]);
    template.enable_key_capture("ESCAPE", true);
    template.set_rel_hit_rect_insets(Bounds2::new(0.1, 0.1, 0.0, 0.0));

    let frame = manager
        .create_root_frame(ObjectAttributes::frame("Draggable").inherits(template.clone()))
        .unwrap();
    assert!(frame.is_mouse_click_enabled());
    assert!(frame.is_mouse_move_enabled());
    assert!(frame.is_movable());
    assert!(frame.is_registered_for_drag("LeftButton"));
    assert!(frame.is_key_capture_enabled("ESCAPE"));
    assert_eq!(frame.rel_hit_rect_insets(), Bounds2::new(0.1, 0.1, 0.0, 0.0));
}
