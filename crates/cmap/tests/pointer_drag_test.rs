//! Integration tests for pointer-driven dragging and rewiring.

use float_cmp::assert_approx_eq;

use cmap::{
    ComponentId, Diagram, DragState, End, LinkId, ShapeId,
    component::{LinkAttrs, ShapeAttrs},
    geometry::Point,
    render::RecordingSink,
};

struct Scene {
    diagram: Diagram,
    a: ShapeId,
    b: ShapeId,
    c: ShapeId,
    link: LinkId,
}

/// Shapes `a` and `b` side by side joined by `link`, with a free shape `c`
/// below `a`.
fn scene() -> Scene {
    let mut diagram = Diagram::default();
    let a = diagram.create_shape(ShapeAttrs::default().with_content("a"));
    let b = diagram.create_shape(ShapeAttrs::default().with_position(300.0, 0.0));
    let c = diagram.create_shape(ShapeAttrs::default().with_position(0.0, 200.0));
    let link = diagram.create_link(LinkAttrs::default());
    for id in [a.into(), b.into(), c.into(), link.into()] {
        diagram.add(id).expect("Failed to add component");
    }
    diagram.connect(End::Source, a, link).unwrap();
    diagram.connect(End::Target, b, link).unwrap();
    settle(&mut diagram);

    Scene {
        diagram,
        a,
        b,
        c,
        link,
    }
}

fn settle(diagram: &mut Diagram) {
    let report = diagram.settle(&mut RecordingSink::default());
    assert!(!report.aborted);
}

fn center(diagram: &Diagram, shape: ShapeId) -> Point {
    diagram.shape(shape).unwrap().center()
}

#[test]
fn test_dragging_shape_moves_by_pointer_delta() {
    let Scene {
        mut diagram, a, ..
    } = scene();

    let press = center(&diagram, a);
    assert_eq!(diagram.pointer_down(press).unwrap(), Some(a.into()));
    diagram.pointer_move(press.add_point(Point::new(20.0, 30.0))).unwrap();
    diagram.pointer_move(press.add_point(Point::new(40.0, 10.0))).unwrap();
    diagram.pointer_up();
    settle(&mut diagram);

    assert_eq!(diagram.shape(a).unwrap().position(), Point::new(40.0, 10.0));
    assert!(diagram.drag_state().is_idle());
    assert_eq!(diagram.render_order().last(), Some(ComponentId::Shape(a)));
}

#[test]
fn test_undraggable_shape_stays_put() {
    let Scene {
        mut diagram, a, ..
    } = scene();
    diagram.set_draggable(a.into(), false).unwrap();

    let press = center(&diagram, a);
    diagram.pointer_down(press).unwrap();
    diagram.pointer_move(press.add_point(Point::new(50.0, 0.0))).unwrap();
    diagram.pointer_up();

    assert_eq!(diagram.shape(a).unwrap().position(), Point::new(0.0, 0.0));
}

#[test]
fn test_pressing_link_selects_it_and_shows_connectors() {
    let Scene {
        mut diagram,
        a,
        link,
        ..
    } = scene();

    let mid = diagram.link(link).unwrap().mid();
    assert_eq!(diagram.pointer_down(mid).unwrap(), Some(link.into()));
    diagram.pointer_up();

    assert_eq!(diagram.selected_link(), Some(link));
    let source = diagram.connector(End::Source, link).unwrap();
    let target = diagram.connector(End::Target, link).unwrap();
    let order: Vec<ComponentId> = diagram.render_order().collect();
    let expected = [
        ComponentId::Link(link),
        ComponentId::Marker(source),
        ComponentId::Marker(target),
    ];
    assert_eq!(&order[order.len() - 3..], &expected);

    // pressing elsewhere hides them again
    diagram.pointer_down(center(&diagram, a)).unwrap();
    assert_eq!(diagram.selected_link(), None);
    assert_eq!(diagram.connector(End::Source, link), None);
    assert_eq!(diagram.connector(End::Target, link), None);
}

#[test]
fn test_dragging_marker_rewires_link() {
    let Scene {
        mut diagram,
        a,
        b,
        c,
        link,
    } = scene();

    let mid = diagram.link(link).unwrap().mid();
    diagram.pointer_down(mid).unwrap();
    diagram.pointer_up();
    settle(&mut diagram);

    let marker = diagram.connector(End::Target, link).unwrap();
    let handle = diagram.marker(marker).unwrap().position();
    assert_eq!(diagram.pointer_down(handle).unwrap(), Some(marker.into()));
    assert_eq!(
        diagram.drag_state(),
        DragState::Connector {
            link,
            end: End::Target
        }
    );

    diagram.pointer_move(center(&diagram, c)).unwrap();
    diagram.pointer_up();
    settle(&mut diagram);

    assert_eq!(diagram.connected_shape(End::Source, link), Some(a));
    assert_eq!(diagram.connected_shape(End::Target, link), Some(c));
    assert!(diagram.relations_of(b.into()).is_empty());
    assert!(diagram.marker(marker).unwrap().state().is_connected());

    let target = diagram.link(link).unwrap().target();
    let outline = diagram.shape(c).unwrap().outline();
    assert_approx_eq!(f32, outline.signed_distance(target), 0.0, epsilon = 0.01);
    assert_eq!(diagram.marker(marker).unwrap().position(), target);
}

#[test]
fn test_dragging_marker_off_shapes_floats_endpoint() {
    let Scene {
        mut diagram,
        a,
        link,
        ..
    } = scene();

    let mid = diagram.link(link).unwrap().mid();
    diagram.pointer_down(mid).unwrap();
    diagram.pointer_up();

    let marker = diagram.connector(End::Target, link).unwrap();
    let handle = diagram.marker(marker).unwrap().position();
    diagram.pointer_down(handle).unwrap();
    diagram.pointer_move(Point::new(500.0, 400.0)).unwrap();
    diagram.pointer_up();
    settle(&mut diagram);

    assert_eq!(diagram.connected_shape(End::Target, link), None);
    assert_eq!(diagram.connected_shape(End::Source, link), Some(a));
    assert_eq!(diagram.link(link).unwrap().target(), Point::new(500.0, 400.0));
    assert!(!diagram.marker(marker).unwrap().state().is_connected());
}

#[test]
fn test_marker_rewired_then_floated_in_one_frame_reanchors() {
    let Scene {
        mut diagram,
        a,
        c,
        link,
        ..
    } = scene();

    let mid = diagram.link(link).unwrap().mid();
    diagram.pointer_down(mid).unwrap();
    diagram.pointer_up();

    let marker = diagram.connector(End::Target, link).unwrap();
    let handle = diagram.marker(marker).unwrap().position();
    diagram.pointer_down(handle).unwrap();
    diagram.pointer_move(center(&diagram, c)).unwrap();
    diagram.pointer_move(Point::new(500.0, 400.0)).unwrap();
    diagram.pointer_up();
    settle(&mut diagram);

    assert_eq!(diagram.connected_shape(End::Target, link), None);
    let geometry = diagram.link(link).unwrap().geometry();
    let target = Point::new(500.0, 400.0);
    let source = diagram.shape(a).unwrap().connected_point(target);
    assert_eq!(geometry.target, target);
    assert_approx_eq!(f32, geometry.source.x(), source.x(), epsilon = 0.01);
    assert_approx_eq!(f32, geometry.source.y(), source.y(), epsilon = 0.01);
    let recentered = geometry.source.midpoint(target);
    assert_approx_eq!(f32, geometry.mid.x(), recentered.x(), epsilon = 0.01);
    assert_approx_eq!(f32, geometry.mid.y(), recentered.y(), epsilon = 0.01);
    assert!(!diagram.needs_settle());
}

#[test]
fn test_marker_cannot_rewire_onto_opposite_shape() {
    let Scene {
        mut diagram,
        a,
        link,
        ..
    } = scene();

    let mid = diagram.link(link).unwrap().mid();
    diagram.pointer_down(mid).unwrap();
    diagram.pointer_up();

    let marker = diagram.connector(End::Target, link).unwrap();
    let handle = diagram.marker(marker).unwrap().position();
    diagram.pointer_down(handle).unwrap();
    diagram.pointer_move(center(&diagram, a)).unwrap();
    diagram.pointer_up();
    settle(&mut diagram);

    assert_eq!(diagram.connected_shape(End::Source, link), Some(a));
    assert_eq!(diagram.connected_shape(End::Target, link), None);
}

#[test]
fn test_dragging_half_anchored_link_rotates_about_shape() {
    let Scene {
        mut diagram,
        a,
        b,
        link,
        ..
    } = scene();
    diagram.disconnect(End::Target, b, link).unwrap();
    settle(&mut diagram);
    let length = diagram.link(link).unwrap().geometry().length();

    let mid = diagram.link(link).unwrap().mid();
    let anchor = center(&diagram, a);
    diagram.pointer_down(mid).unwrap();
    // a quarter turn around the anchored shape
    let turned = anchor.add_point(Point::new(anchor.y() - mid.y(), mid.x() - anchor.x()));
    diagram.pointer_move(turned).unwrap();
    diagram.pointer_up();
    settle(&mut diagram);

    let geometry = diagram.link(link).unwrap().geometry();
    assert_approx_eq!(f32, geometry.length(), length, epsilon = 0.05);
    assert!(geometry.target.y() > anchor.y() + length * 0.5);
    assert_eq!(diagram.connected_shape(End::Source, link), Some(a));
}

#[test]
fn test_dragging_free_link_translates_it() {
    let mut diagram = Diagram::default();
    let link = diagram.create_link(LinkAttrs::default());
    diagram.add(link.into()).unwrap();
    settle(&mut diagram);
    let before = diagram.link(link).unwrap().geometry();

    diagram.pointer_down(before.mid).unwrap();
    diagram
        .pointer_move(before.mid.add_point(Point::new(25.0, -10.0)))
        .unwrap();
    diagram.pointer_up();
    settle(&mut diagram);

    let after = diagram.link(link).unwrap().geometry();
    assert_eq!(after, before.translate(Point::new(25.0, -10.0)));
}

#[test]
fn test_removing_dragged_shape_resets_drag() {
    let Scene {
        mut diagram, c, ..
    } = scene();

    diagram.pointer_down(center(&diagram, c)).unwrap();
    diagram.remove(c.into()).unwrap();
    assert!(diagram.drag_state().is_idle());
    diagram.pointer_move(Point::new(10.0, 10.0)).unwrap();
}
