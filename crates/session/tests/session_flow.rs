use glam::Vec2;
use mekanix_common::{Corner, EntityKind, Mode};
use mekanix_input::{Action, PointerEvent, Tool};
use mekanix_kernel::{GraphViolation, Level, PartEnd, PropertyEdit, presets};
use mekanix_physics::CompileError;
use mekanix_session::{MekanixConfig, Session, SessionError, SessionEvent};

fn click(session: &mut Session, at: Vec2) {
    session.pointer(PointerEvent::down(at)).unwrap();
    session.pointer(PointerEvent::up(at)).unwrap();
}

fn drag(session: &mut Session, from: Vec2, to: Vec2) {
    session.pointer(PointerEvent::down(from)).unwrap();
    for i in 1..=4 {
        let t = i as f32 / 4.0;
        session.pointer(PointerEvent::moved(from.lerp(to, t))).unwrap();
    }
    session.pointer(PointerEvent::up(to)).unwrap();
}

#[test]
fn place_platform_then_resize_by_handle() {
    let mut session = Session::default();
    session.apply(Action::SelectTool(Tool::Platform)).unwrap();
    click(&mut session, Vec2::new(360.0, 600.0));
    let selection = session.controller().selection().unwrap();
    assert_eq!(selection.kind, EntityKind::Platform);
    let id = selection.id;

    session.apply(Action::SelectTool(Tool::Move)).unwrap();
    let rect = session.level().unwrap().shape_of(id).unwrap();
    let handle = rect.corner(Corner::BottomRight);
    let pinned = rect.corner(Corner::TopLeft);
    drag(&mut session, handle, handle + Vec2::new(40.0, 25.0));

    let level = session.level().unwrap();
    let platform = level.platform(id).unwrap();
    assert!((platform.width - (rect.width() + 40.0)).abs() < 1e-3);
    assert!((platform.height - (rect.height() + 25.0)).abs() < 1e-3);
    let after = level.shape_of(id).unwrap().corner(Corner::TopLeft);
    assert!(after.distance(pinned) < 1e-3);
    assert!(session.events().contains(&SessionEvent::Dirty));
}

#[test]
fn play_round_trip_keeps_every_id() {
    let mut session = Session::default();
    let root = session.level().unwrap().player().primary;
    session.select(root).unwrap();
    session.apply(Action::AddConnectedPart(PartEnd::Tail)).unwrap();
    session.apply(Action::AddConnectedPart(PartEnd::Head)).unwrap();
    let before = session.level().unwrap().clone();

    session.apply(Action::TogglePlay).unwrap();
    session.pointer(PointerEvent::down(Vec2::ZERO)).unwrap();
    for _ in 0..20 {
        session.advance(1.0 / 60.0);
    }
    session.pointer(PointerEvent::up(Vec2::ZERO)).unwrap();
    for _ in 0..20 {
        session.advance(1.0 / 60.0);
    }
    session.apply(Action::TogglePlay).unwrap();

    let after = session.level().unwrap();
    assert_eq!(after.entity_ids(), before.entity_ids());
    assert_eq!(after.next_id(), before.next_id());
    assert_eq!(after, &before);
}

#[test]
fn dangling_joint_keeps_session_in_edit() {
    let mut value = serde_json::to_value(presets::default_level()).unwrap();
    let joints = value["joints"].as_object_mut().unwrap();
    let (_, joint) = joints.iter_mut().next().unwrap();
    joint["b"] = serde_json::json!(999);
    let level: Level = serde_json::from_value(value).unwrap();
    let before = level.clone();

    let mut session = Session::new(level, MekanixConfig::default());
    let err = session.enter_play().unwrap_err();
    assert!(matches!(
        err,
        SessionError::Compile(CompileError::InvalidLevelGraph {
            violation: GraphViolation::Dangling(_),
            ..
        })
    ));
    assert_eq!(session.mode(), Mode::Edit);
    assert_eq!(session.level().unwrap(), &before);
    assert!(session.events().is_empty());
}

#[test]
fn reaching_the_goal_is_reported_once() {
    let mut session = Session::default();
    let level = session.level().unwrap();
    let goal = level.goal().id;
    let start = level.part(level.player().primary).unwrap().center;
    session.select(goal).unwrap();
    session.apply(Action::SetProperty(PropertyEdit::Position(start))).unwrap();
    session.drain_events();

    session.enter_play().unwrap();
    for _ in 0..60 {
        session.advance(1.0 / 60.0);
    }
    let won = session
        .drain_events()
        .into_iter()
        .filter(|e| *e == SessionEvent::LevelWon)
        .count();
    assert_eq!(won, 1);
    assert!(session.world().unwrap().is_won());
}

#[test]
fn delete_tool_respects_player_root() {
    let mut session = Session::default();
    let level = session.level().unwrap();
    let parts: Vec<_> = level.parts().keys().copied().collect();
    let on_leg = |level: &Level, id| level.part(id).unwrap().rect().to_world(Vec2::new(0.0, 30.0));

    session.apply(Action::SelectTool(Tool::Delete)).unwrap();
    let at = on_leg(session.level().unwrap(), parts[1]);
    click(&mut session, at);
    let level = session.level().unwrap();
    assert_eq!(level.parts().len(), 1);
    assert!(level.joints().is_empty());

    let at = on_leg(level, parts[0]);
    let err = session.pointer(PointerEvent::down(at)).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Level(mekanix_kernel::LevelError::CannotDeletePlayerRoot(_))
    ));
    assert_eq!(session.level().unwrap().parts().len(), 1);
}

#[test]
fn rewound_id_counter_is_not_imported() {
    let mut session = Session::default();
    let mut value: serde_json::Value = serde_json::from_str(&session.export_document().unwrap()).unwrap();
    value["level"]["next_id"] = serde_json::json!(1);
    let before = session.level().unwrap().clone();

    let err = session.import_document(&value.to_string()).unwrap_err();
    assert!(matches!(err, SessionError::Document(_)));
    assert_eq!(session.level().unwrap(), &before);

    session.apply(Action::AddPlatform(Vec2::new(100.0, 300.0))).unwrap();
    let level = session.level().unwrap();
    let added = *level.platforms().keys().last().unwrap();
    assert_eq!(added, before.next_id());
    assert_eq!(level.kind_of(level.goal().id), Some(EntityKind::Goal));
}

#[test]
fn grown_limb_is_picked_at_its_center() {
    let mut session = Session::default();
    let root = session.level().unwrap().player().primary;
    let on_root = session.level().unwrap().part(root).unwrap().rect().to_world(Vec2::new(0.0, 30.0));
    session.apply(Action::SelectTool(Tool::Player)).unwrap();
    click(&mut session, on_root);
    let limb = session.controller().selection().unwrap().id;
    let center = session.level().unwrap().part(limb).unwrap().center;

    session.apply(Action::SelectTool(Tool::Move)).unwrap();
    click(&mut session, center);
    let sel = session.controller().selection().unwrap();
    assert_eq!((sel.id, sel.kind), (limb, EntityKind::Part));

    session.apply(Action::SelectTool(Tool::Delete)).unwrap();
    click(&mut session, center);
    let level = session.level().unwrap();
    assert!(level.part(limb).is_none());
    assert_eq!(level.parts().len(), 2);
}
