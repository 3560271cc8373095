use super::*;
use crate::animation::progress::{Ease, Progress, ValueStream};
use crate::foundation::geometry::Axis;
use crate::projection::instance::SharedLayout;
use crate::projection::scale_correction::Length;
use crate::scheduler::driver::ManualDriver;
use crate::scheduler::frameloop::{FrameScheduler, SchedulerConfig};
use crate::scheduler::phase::Phase;

fn bx(x0: f64, x1: f64, y0: f64, y1: f64) -> LayoutBox {
    LayoutBox::new(Axis::new(x0, x1), Axis::new(y0, y1))
}

fn linear_tree() -> ProjectionTree {
    ProjectionTree::new(ProjectionSettings {
        hardware_acceleration: true,
        transition: Timed::new(300.0, Ease::Linear),
    })
}

fn mounted(
    tree: &mut ProjectionTree,
    parent: Option<NodeId>,
    options: ProjectionOptions,
    layout: LayoutBox,
) -> (NodeId, SharedLayout) {
    let id = tree.create_node(parent, options).unwrap();
    let shared = SharedLayout::new(layout);
    tree.mount(id, Box::new(shared.clone())).unwrap();
    tree.update_layout(id);
    tree.resolve_targets();
    (id, shared)
}

fn transforms(tree: &mut ProjectionTree) -> Vec<(NodeId, String)> {
    tree.take_updates()
        .into_iter()
        .map(|u| (u.node, u.transform))
        .collect()
}

#[test]
fn depth_and_traversal_order() {
    let mut tree = ProjectionTree::default();
    let root = tree.create_node(None, ProjectionOptions::default()).unwrap();
    let a = tree.create_node(Some(root), ProjectionOptions::default()).unwrap();
    let a1 = tree.create_node(Some(a), ProjectionOptions::default()).unwrap();
    let b = tree.create_node(Some(root), ProjectionOptions::default()).unwrap();

    assert_eq!(tree.node(root).unwrap().depth(), 0);
    assert_eq!(tree.node(a1).unwrap().depth(), 2);
    assert_eq!(tree.dfs_order(), vec![root, a, a1, b]);
    assert_eq!(tree.subtree(a), vec![a, a1]);
    assert_eq!(tree.node(root).unwrap().children(), &[a, b]);
}

#[test]
fn stale_handles_are_rejected_after_slot_reuse() {
    let mut tree = ProjectionTree::default();
    let old = tree.create_node(None, ProjectionOptions::default()).unwrap();
    tree.unmount(old).unwrap();
    let new = tree.create_node(None, ProjectionOptions::default()).unwrap();

    assert_eq!(old.index(), new.index());
    assert_ne!(old.generation(), new.generation());
    assert!(tree.node(old).is_err());
    assert!(tree.will_update(old).is_err());
    assert!(tree.node(new).is_ok());
}

#[test]
fn unmeasured_node_does_not_animate() {
    let mut tree = linear_tree();
    let id = tree.create_node(None, ProjectionOptions::default()).unwrap();
    tree.mount(id, Box::new(SharedLayout::unmeasured())).unwrap();
    tree.will_update(id).unwrap();
    tree.did_update(id).unwrap();
    assert!(tree.node(id).unwrap().layout().is_none());
    assert!(!tree.has_active_projection());
}

#[test]
fn layout_change_animates_from_previous_box() {
    let mut tree = linear_tree();
    let (id, layout) = mounted(
        &mut tree,
        None,
        ProjectionOptions::default(),
        bx(0.0, 100.0, 0.0, 100.0),
    );

    tree.will_update(id).unwrap();
    layout.set(bx(100.0, 200.0, 0.0, 100.0));
    tree.did_update(id).unwrap();

    let node = tree.node(id).unwrap();
    assert!(node.is_animating());
    assert_eq!(node.animation_delta().unwrap().x.translate, -100.0);
    assert_eq!(
        node.build_layout_animation_transform(0.0),
        "translate3d(-100px, 0px, 0px) scale(1, 1)"
    );
    assert_eq!(node.build_layout_animation_transform(1.0), "none");

    tree.render_projections(1000.0);
    tree.render_projections(1150.0);
    tree.render_projections(1300.0);
    let updates = tree.take_updates();
    let strings: Vec<&str> = updates.iter().map(|u| u.transform.as_str()).collect();
    assert_eq!(
        strings,
        vec![
            "translate3d(-100px, 0px, 0px) scale(1, 1)",
            "translate3d(-50px, 0px, 0px) scale(1, 1)",
            "none",
        ]
    );
    assert!(updates[0].accelerated);
    assert!(!tree.has_active_projection());
    assert!(tree.node(id).unwrap().target_delta().is_none());
}

#[test]
fn unchanged_layout_emits_nothing() {
    let mut tree = linear_tree();
    let (id, _layout) = mounted(
        &mut tree,
        None,
        ProjectionOptions::default(),
        bx(0.0, 100.0, 0.0, 100.0),
    );
    tree.will_update(id).unwrap();
    tree.did_update(id).unwrap();
    tree.render_projections(0.0);
    assert!(tree.take_updates().is_empty());
}

#[test]
fn repeated_frames_without_change_are_not_re_emitted() {
    let mut tree = linear_tree();
    let (id, layout) = mounted(
        &mut tree,
        None,
        ProjectionOptions::default(),
        bx(0.0, 100.0, 0.0, 100.0),
    );
    tree.set_progress_source(id, Box::new(|_: f64| Progress::running(0.5)))
        .unwrap();
    tree.will_update(id).unwrap();
    layout.set(bx(100.0, 200.0, 0.0, 100.0));
    tree.did_update(id).unwrap();

    tree.render_projections(0.0);
    tree.render_projections(16.0);
    tree.render_projections(32.0);
    assert_eq!(tree.take_updates().len(), 1);
}

#[test]
fn position_and_size_modes_ignore_the_other_change() {
    let mut tree = linear_tree();
    let position = ProjectionOptions {
        layout: LayoutMode::Position,
        ..ProjectionOptions::default()
    };
    let (p, p_layout) = mounted(&mut tree, None, position, bx(0.0, 100.0, 0.0, 100.0));
    let size = ProjectionOptions {
        layout: LayoutMode::Size,
        ..ProjectionOptions::default()
    };
    let (s, s_layout) = mounted(&mut tree, None, size, bx(0.0, 100.0, 0.0, 100.0));

    tree.will_update(p).unwrap();
    tree.will_update(s).unwrap();
    p_layout.set(bx(0.0, 300.0, 0.0, 100.0));
    s_layout.set(bx(50.0, 150.0, 0.0, 100.0));
    tree.did_update(p).unwrap();
    tree.did_update(s).unwrap();

    assert!(!tree.node(p).unwrap().is_animating());
    assert!(!tree.node(s).unwrap().is_animating());
}

#[test]
fn disabled_layout_never_animates() {
    let mut tree = linear_tree();
    let options = ProjectionOptions {
        layout: LayoutMode::Disabled,
        ..ProjectionOptions::default()
    };
    let (id, layout) = mounted(&mut tree, None, options, bx(0.0, 100.0, 0.0, 100.0));
    tree.will_update(id).unwrap();
    layout.set(bx(100.0, 200.0, 0.0, 100.0));
    tree.did_update(id).unwrap();
    assert!(!tree.node(id).unwrap().is_animating());
    assert_eq!(tree.node(id).unwrap().layout(), Some(bx(100.0, 200.0, 0.0, 100.0)));
}

#[test]
fn unchanged_layout_dependency_skips_the_snapshot() {
    let mut tree = linear_tree();
    let options = ProjectionOptions {
        layout_dependency: Some("v1".into()),
        ..ProjectionOptions::default()
    };
    let (id, layout) = mounted(&mut tree, None, options, bx(0.0, 100.0, 0.0, 100.0));

    tree.will_update(id).unwrap();
    layout.set(bx(100.0, 200.0, 0.0, 100.0));
    tree.did_update(id).unwrap();
    assert!(tree.node(id).unwrap().is_animating());
    tree.render_projections(0.0);
    tree.render_projections(300.0);
    assert!(!tree.node(id).unwrap().is_animating());

    tree.will_update(id).unwrap();
    layout.set(bx(0.0, 100.0, 0.0, 100.0));
    tree.did_update(id).unwrap();
    assert!(!tree.node(id).unwrap().is_animating());
}

#[test]
fn child_moving_with_parent_is_corrected_to_identity() {
    let mut tree = linear_tree();
    let (parent, p_layout) = mounted(
        &mut tree,
        None,
        ProjectionOptions::default(),
        bx(0.0, 200.0, 0.0, 100.0),
    );
    let (child, c_layout) = mounted(
        &mut tree,
        Some(parent),
        ProjectionOptions::default(),
        bx(0.0, 50.0, 0.0, 50.0),
    );
    tree.set_progress_source(parent, Box::new(|_: f64| Progress::running(0.5)))
        .unwrap();

    tree.will_update(parent).unwrap();
    p_layout.set(bx(100.0, 300.0, 0.0, 100.0));
    c_layout.set(bx(100.0, 150.0, 0.0, 50.0));
    tree.did_update(parent).unwrap();
    assert!(tree.node(child).unwrap().relative_target().is_some());

    tree.render_projections(0.0);
    let updates = tree.take_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].node, parent);
    assert_eq!(
        updates[0].transform,
        "translate3d(-50px, 0px, 0px) scale(1, 1)"
    );
    assert!(!updates[0].accelerated);
    assert_eq!(tree.node(child).unwrap().target(), Some(bx(50.0, 100.0, 0.0, 50.0)));
}

#[test]
fn scaled_parent_counter_scales_child() {
    let mut tree = linear_tree();
    let (parent, p_layout) = mounted(
        &mut tree,
        None,
        ProjectionOptions::default(),
        bx(0.0, 100.0, 0.0, 100.0),
    );
    let (child, _c_layout) = mounted(
        &mut tree,
        Some(parent),
        ProjectionOptions::default(),
        bx(0.0, 50.0, 0.0, 50.0),
    );

    tree.will_update(parent).unwrap();
    p_layout.set(bx(0.0, 200.0, 0.0, 200.0));
    tree.did_update(parent).unwrap();

    tree.render_projections(0.0);
    let updates = transforms(&mut tree);
    let child_transform = updates
        .iter()
        .find(|(n, _)| *n == child)
        .map(|(_, t)| t.as_str());
    assert_eq!(
        child_transform,
        Some("translate3d(25px, 25px, 0px) scale(2, 2)")
    );
}

#[test]
fn layout_root_stops_relative_linking() {
    let mut tree = linear_tree();
    let (parent, p_layout) = mounted(
        &mut tree,
        None,
        ProjectionOptions::default(),
        bx(0.0, 100.0, 0.0, 100.0),
    );
    let options = ProjectionOptions {
        layout_root: true,
        ..ProjectionOptions::default()
    };
    let (child, _c_layout) = mounted(&mut tree, Some(parent), options, bx(0.0, 10.0, 0.0, 10.0));

    tree.will_update(parent).unwrap();
    p_layout.set(bx(50.0, 150.0, 0.0, 100.0));
    tree.did_update(parent).unwrap();
    assert!(tree.node(child).unwrap().relative_target().is_none());
}

#[test]
fn interrupted_transition_snapshots_the_visual_box() {
    let mut tree = linear_tree();
    let (id, layout) = mounted(
        &mut tree,
        None,
        ProjectionOptions::default(),
        bx(0.0, 100.0, 0.0, 100.0),
    );
    tree.will_update(id).unwrap();
    layout.set(bx(100.0, 200.0, 0.0, 100.0));
    tree.did_update(id).unwrap();
    tree.render_projections(0.0);
    tree.render_projections(150.0);

    tree.will_update(id).unwrap();
    assert_eq!(
        tree.node(id).unwrap().snapshot(),
        Some(bx(50.0, 150.0, 0.0, 100.0))
    );
}

#[test]
fn border_radius_is_corrected_against_the_target() {
    let mut tree = linear_tree();
    let options = ProjectionOptions {
        border_radius: Some(Length::Px(10.0)),
        ..ProjectionOptions::default()
    };
    let (id, layout) = mounted(&mut tree, None, options, bx(0.0, 100.0, 0.0, 100.0));
    tree.will_update(id).unwrap();
    layout.set(bx(0.0, 200.0, 0.0, 100.0));
    tree.did_update(id).unwrap();

    tree.render_projections(0.0);
    let updates = tree.take_updates();
    assert_eq!(updates[0].transform, "translate3d(-50px, 0px, 0px) scale(0.5, 1)");
    assert_eq!(updates[0].border_radius.as_deref(), Some("10% 10%"));
}

#[test]
fn shared_key_resumes_from_previous_lead() {
    let mut tree = linear_tree();
    let (a, _a_layout) = mounted(
        &mut tree,
        None,
        ProjectionOptions::keyed("card"),
        bx(0.0, 100.0, 0.0, 100.0),
    );
    let (b, _b_layout) = mounted(
        &mut tree,
        None,
        ProjectionOptions::keyed("card"),
        bx(300.0, 400.0, 0.0, 100.0),
    );

    assert_eq!(tree.lead("card"), Some(b));
    assert!(tree.node(b).unwrap().is_animating());
    assert!(!tree.can_use_hardware_acceleration(b));
    assert_eq!(tree.node(b).unwrap().resume_from(), Some(a));

    tree.render_projections(0.0);
    let updates = tree.take_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].transform, "translate3d(-300px, 0px, 0px) scale(1, 1)");
    assert!(!updates[0].accelerated);

    tree.render_projections(300.0);
    assert_eq!(tree.node(b).unwrap().resume_from(), None);
}

#[test]
fn unmounting_the_lead_promotes_the_other_member() {
    let mut tree = linear_tree();
    let (a, _a_layout) = mounted(
        &mut tree,
        None,
        ProjectionOptions::keyed("card"),
        bx(0.0, 100.0, 0.0, 100.0),
    );
    let (b, _b_layout) = mounted(
        &mut tree,
        None,
        ProjectionOptions::keyed("card"),
        bx(300.0, 400.0, 0.0, 100.0),
    );
    tree.render_projections(0.0);
    tree.render_projections(300.0);

    let unmounted = tree.unmount(b).unwrap();
    assert_eq!(unmounted.removed, vec![b]);
    assert_eq!(unmounted.promoted, vec![a]);
    assert_eq!(tree.lead("card"), Some(a));
    assert_eq!(tree.node(a).unwrap().resume_from(), Some(b));
}

#[test]
fn remount_under_same_key_resumes_from_departed_lead() {
    let mut tree = linear_tree();
    let (a, _a_layout) = mounted(
        &mut tree,
        None,
        ProjectionOptions::keyed("card"),
        bx(0.0, 100.0, 0.0, 100.0),
    );
    tree.unmount(a).unwrap();
    assert!(tree.registry().stack("card").is_none());

    let c = tree.create_node(None, ProjectionOptions::keyed("card")).unwrap();
    tree.mount(c, Box::new(SharedLayout::new(bx(0.0, 50.0, 0.0, 50.0))))
        .unwrap();
    assert_eq!(tree.node(c).unwrap().resume_from(), Some(a));
    tree.update_layout(c);
    tree.resolve_targets();
    assert!(tree.node(c).unwrap().is_animating());
}

#[test]
fn re_keying_is_atomic_and_keeps_the_lead() {
    let mut tree = linear_tree();
    let (a, _) = mounted(
        &mut tree,
        None,
        ProjectionOptions::keyed("one"),
        bx(0.0, 10.0, 0.0, 10.0),
    );
    let (b, _) = mounted(
        &mut tree,
        None,
        ProjectionOptions::keyed("one"),
        bx(0.0, 10.0, 0.0, 10.0),
    );
    assert_eq!(tree.lead("one"), Some(b));

    tree.set_options(b, ProjectionOptions::keyed("two")).unwrap();
    assert_eq!(tree.lead("one"), Some(a));
    assert_eq!(tree.lead("two"), Some(b));
    assert_eq!(tree.registry().stacks_containing(b), vec!["two"]);
}

#[test]
fn re_keying_the_lead_hands_over_like_unmount() {
    let mut tree = linear_tree();
    let (a, _) = mounted(
        &mut tree,
        None,
        ProjectionOptions::keyed("k"),
        bx(0.0, 100.0, 0.0, 100.0),
    );
    let (b, _) = mounted(
        &mut tree,
        None,
        ProjectionOptions::keyed("k"),
        bx(200.0, 300.0, 0.0, 100.0),
    );
    tree.render_projections(0.0);
    tree.render_projections(300.0);
    tree.take_updates();

    let promoted = tree.set_options(b, ProjectionOptions::keyed("z")).unwrap();
    assert_eq!(promoted, Some(a));
    assert_eq!(tree.lead("k"), Some(a));
    assert_eq!(tree.node(a).unwrap().resume_from(), Some(b));

    tree.update_layout(a);
    tree.resolve_targets();
    assert!(tree.node(a).unwrap().is_animating());
    tree.render_projections(400.0);
    assert_eq!(
        transforms(&mut tree),
        vec![(a, "translate3d(200px, 0px, 0px) scale(1, 1)".to_string())]
    );
}

#[test]
fn re_keying_a_follower_promotes_nobody() {
    let mut tree = linear_tree();
    let (a, _) = mounted(
        &mut tree,
        None,
        ProjectionOptions::keyed("k"),
        bx(0.0, 10.0, 0.0, 10.0),
    );
    let (b, _) = mounted(
        &mut tree,
        None,
        ProjectionOptions::keyed("k"),
        bx(0.0, 10.0, 0.0, 10.0),
    );

    assert_eq!(tree.set_options(a, ProjectionOptions::keyed("z")).unwrap(), None);
    assert_eq!(tree.lead("k"), Some(b));
    assert_eq!(tree.node(b).unwrap().resume_from(), None);
}

#[test]
fn linked_child_stays_anchored_when_parent_finishes_first() {
    let mut tree = linear_tree();
    let (parent, p_layout) = mounted(
        &mut tree,
        None,
        ProjectionOptions::default(),
        bx(0.0, 100.0, 0.0, 100.0),
    );
    let (child, c_layout) = mounted(
        &mut tree,
        Some(parent),
        ProjectionOptions::default(),
        bx(0.0, 10.0, 0.0, 10.0),
    );
    tree.set_progress_source(
        parent,
        Box::new(ValueStream::new(vec![0.0, 0.5, 1.0], 16.0)),
    )
    .unwrap();
    tree.set_progress_source(
        child,
        Box::new(ValueStream::new(vec![0.0, 0.25, 0.5, 0.75, 1.0], 16.0)),
    )
    .unwrap();

    tree.will_update(parent).unwrap();
    p_layout.set(bx(100.0, 200.0, 0.0, 100.0));
    c_layout.set(bx(100.0, 110.0, 0.0, 10.0));
    tree.did_update(parent).unwrap();

    let mut xs = Vec::new();
    for now in [0.0, 16.0, 32.0, 48.0] {
        tree.render_projections(now);
        xs.push(tree.node(child).unwrap().target().unwrap().x);
    }
    assert!(!tree.node(parent).unwrap().is_projecting());
    assert_eq!(
        xs,
        vec![
            Axis::new(0.0, 10.0),
            Axis::new(50.0, 60.0),
            Axis::new(100.0, 110.0),
            Axis::new(100.0, 110.0),
        ]
    );

    tree.render_projections(64.0);
    assert!(!tree.has_active_projection());
    assert_eq!(tree.node(child).unwrap().target(), None);
}

#[test]
fn staged_options_apply_together() {
    let mut tree = linear_tree();
    let (a, _) = mounted(
        &mut tree,
        None,
        ProjectionOptions::keyed("one"),
        bx(0.0, 10.0, 0.0, 10.0),
    );
    tree.stage_options(a, ProjectionOptions::keyed("two")).unwrap();
    assert!(tree.has_staged());
    assert_eq!(tree.lead("one"), Some(a));

    tree.apply_staged().unwrap();
    assert!(!tree.has_staged());
    assert_eq!(tree.lead("one"), None);
    assert_eq!(tree.lead("two"), Some(a));
}

#[test]
fn exiting_lead_hands_over_to_present_member() {
    let mut tree = linear_tree();
    let (a, _) = mounted(
        &mut tree,
        None,
        ProjectionOptions::keyed("card"),
        bx(0.0, 10.0, 0.0, 10.0),
    );
    let (b, _) = mounted(
        &mut tree,
        None,
        ProjectionOptions::keyed("card"),
        bx(20.0, 30.0, 0.0, 10.0),
    );
    assert_eq!(tree.set_present(b, false).unwrap(), Some(a));
    assert_eq!(tree.lead("card"), Some(a));
    assert!(!tree.node(b).unwrap().is_present());
    assert_eq!(tree.node(a).unwrap().resume_from(), Some(b));
}

#[test]
fn unmount_returns_tracked_callbacks_of_the_subtree() {
    let mut tree = linear_tree();
    let (parent, _) = mounted(
        &mut tree,
        None,
        ProjectionOptions::default(),
        bx(0.0, 10.0, 0.0, 10.0),
    );
    let (child, _) = mounted(
        &mut tree,
        Some(parent),
        ProjectionOptions::default(),
        bx(0.0, 10.0, 0.0, 10.0),
    );
    let (driver, _clock) = ManualDriver::new();
    let mut scheduler: FrameScheduler<ProjectionTree> =
        FrameScheduler::new(SchedulerConfig::manual(), Box::new(driver));
    let handle = scheduler.schedule(Phase::Read, |_| Ok(()), false);
    tree.track_callback(child, handle);
    assert_eq!(tree.tracked_callbacks(child), &[handle]);

    let unmounted = tree.unmount(parent).unwrap();
    assert_eq!(unmounted.removed, vec![child, parent]);
    assert_eq!(unmounted.callbacks, vec![handle]);
    assert!(tree.is_empty());
    assert!(tree.roots().is_empty());
}
