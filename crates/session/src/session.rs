use mekanix_author::{GizmoController, GizmoEvent};
use mekanix_common::{EntityId, Mode};
use mekanix_input::{Action, PointerEvent, PointerPhase};
use mekanix_kernel::{Level, LevelError, PartKind};
use mekanix_persist::{DocumentError, LevelDocument, Snapshot, SnapshotError};
use mekanix_physics::{CompileError, PhysicsEvent, PhysicsWorld, compile, extract_snapshot};
use mekanix_render::Frame;

use crate::config::{MekanixConfig, ReturnPolicy};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("document: {0}")]
    Document(#[from] DocumentError),
    #[error("only allowed in edit mode")]
    NotInEditMode,
    #[error("nothing is selected")]
    NothingSelected,
}

/// Notifications for the toolbar and UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    ModeChanged(Mode),
    LevelWon,
    /// The edit-mode level changed since the last notification.
    Dirty,
}

#[derive(Debug)]
enum State {
    Edit { level: Level },
    Play { world: PhysicsWorld, snapshot: Snapshot },
}

/// Owns the level or the simulation, the editor, and the step clock.
#[derive(Debug)]
pub struct Session {
    config: MekanixConfig,
    state: State,
    /// Level the session was opened with; `ResetLevel` goes back to it.
    baseline: Level,
    /// Snapshot of the last Play, kept after returning to Edit.
    last_snapshot: Option<Snapshot>,
    controller: GizmoController,
    accumulator: f32,
    events: Vec<SessionEvent>,
}

impl Session {
    pub fn new(level: Level, config: MekanixConfig) -> Self {
        tracing::info!(level_name = level.name(), "session opened");
        let controller = GizmoController::new(config.editor.clone());
        Self {
            config,
            baseline: level.clone(),
            state: State::Edit { level },
            last_snapshot: None,
            controller,
            accumulator: 0.0,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &MekanixConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        match self.state {
            State::Edit { .. } => Mode::Edit,
            State::Play { .. } => Mode::Play,
        }
    }

    pub fn level(&self) -> Option<&Level> {
        match &self.state {
            State::Edit { level } => Some(level),
            State::Play { .. } => None,
        }
    }

    pub fn level_mut(&mut self) -> Result<&mut Level, SessionError> {
        match &mut self.state {
            State::Edit { level } => Ok(level),
            State::Play { .. } => Err(SessionError::NotInEditMode),
        }
    }

    pub fn world(&self) -> Option<&PhysicsWorld> {
        match &self.state {
            State::Edit { .. } => None,
            State::Play { world, .. } => Some(world),
        }
    }

    /// The live snapshot in Play, or the one from the last Play in Edit.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match &self.state {
            State::Play { snapshot, .. } => Some(snapshot),
            State::Edit { .. } => self.last_snapshot.as_ref(),
        }
    }

    pub fn controller(&self) -> &GizmoController {
        &self.controller
    }

    pub fn toolbar_visible(&self) -> bool {
        self.mode() == Mode::Edit
    }

    pub fn gizmos_visible(&self) -> bool {
        self.mode() == Mode::Edit && self.controller.selection().is_some()
    }

    /// Select an entity as if it had been clicked with the Move tool.
    pub fn select(&mut self, id: EntityId) -> Result<(), SessionError> {
        let State::Edit { level } = &self.state else {
            return Err(SessionError::NotInEditMode);
        };
        self.controller.select(level, id)?;
        Ok(())
    }

    pub fn set_view_scale(&mut self, view_scale: f32) {
        self.controller.set_view_scale(view_scale);
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Compile the level and start simulating. No-op in Play.
    pub fn enter_play(&mut self) -> Result<(), SessionError> {
        let State::Edit { level } = &self.state else {
            return Ok(());
        };
        self.controller.cancel_drag();
        let world = match compile(level, &self.config.physics) {
            Ok(world) => world,
            Err(err) => {
                tracing::warn!(%err, "play refused");
                return Err(err.into());
            }
        };
        let snapshot = Snapshot::capture(level)?;
        tracing::info!(
            level_name = level.name(),
            snapshot = %snapshot.id(),
            bodies = world.bodies().len(),
            "entering play"
        );
        self.controller.clear();
        self.last_snapshot = None;
        self.accumulator = 0.0;
        self.state = State::Play { world, snapshot };
        self.events.push(SessionEvent::ModeChanged(Mode::Play));
        Ok(())
    }

    /// Stop simulating and bring the level back. No-op in Edit.
    pub fn enter_edit(&mut self) -> Result<(), SessionError> {
        let State::Play { world, snapshot } = &self.state else {
            return Ok(());
        };
        let restored = snapshot.restore()?;
        let level = match self.config.session.return_policy {
            ReturnPolicy::RestoreSnapshot => restored,
            ReturnPolicy::KeepSimulated => extract_snapshot(world, &restored),
        };
        tracing::info!(
            level_name = level.name(),
            tick = world.tick(),
            policy = ?self.config.session.return_policy,
            "entering edit"
        );
        let previous = std::mem::replace(&mut self.state, State::Edit { level });
        if let State::Play { snapshot, .. } = previous {
            self.last_snapshot = Some(snapshot);
        }
        self.accumulator = 0.0;
        self.events.push(SessionEvent::ModeChanged(Mode::Edit));
        self.flush_dirty();
        Ok(())
    }

    pub fn toggle_mode(&mut self) -> Result<(), SessionError> {
        match self.mode() {
            Mode::Edit => self.enter_play(),
            Mode::Play => self.enter_edit(),
        }
    }

    /// Route pointer input: to the editor in Edit, to the control input in
    /// Play.
    pub fn pointer(&mut self, event: PointerEvent) -> Result<Vec<GizmoEvent>, SessionError> {
        match &mut self.state {
            State::Edit { level } => {
                let result = self.controller.pointer(level, event);
                self.flush_dirty();
                Ok(result?)
            }
            State::Play { world, .. } => {
                match event.phase {
                    PointerPhase::Down => world.set_input_held(true),
                    PointerPhase::Up => world.set_input_held(false),
                    PointerPhase::Move => {}
                }
                Ok(Vec::new())
            }
        }
    }

    /// Feed wall-clock time to the fixed-step clock. Returns the number of
    /// physics steps taken.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        let State::Play { world, .. } = &mut self.state else {
            return 0;
        };
        if !(frame_dt.is_finite() && frame_dt > 0.0) {
            return 0;
        }
        let _span = tracing::info_span!("advance", tick = world.tick()).entered();
        let dt = self.config.session.fixed_dt;
        let max_steps = self.config.session.max_steps_per_frame;

        self.accumulator += frame_dt;
        let mut steps = 0;
        while self.accumulator >= dt && steps < max_steps {
            world.step(dt);
            self.accumulator -= dt;
            steps += 1;
        }
        if self.accumulator >= dt {
            tracing::debug!(backlog = self.accumulator, "dropping physics backlog");
            self.accumulator = 0.0;
        }

        for event in world.drain_events() {
            match event {
                PhysicsEvent::LevelWon { tick } => {
                    tracing::info!(tick, "level won");
                    self.events.push(SessionEvent::LevelWon);
                }
            }
        }
        steps
    }

    /// Apply a toolbar command.
    pub fn apply(&mut self, action: Action) -> Result<(), SessionError> {
        tracing::debug!(?action, mode = %self.mode(), "action");
        let result = match action {
            Action::SelectTool(tool) => {
                self.controller.set_tool(tool);
                Ok(())
            }
            Action::TogglePlay => self.toggle_mode(),
            Action::Deselect => {
                self.controller.clear();
                Ok(())
            }
            Action::ResetLevel => self.reset_level(),
            Action::AddPlatform(at) => self.with_level(|level, controller| {
                let id = level.add_platform(at);
                controller.select(level, id)?;
                Ok(())
            }),
            Action::AddConnectedPart(end) => self.with_level(|level, controller| {
                let sel = controller.selection().ok_or(SessionError::NothingSelected)?;
                let id = level.add_part_at_end(sel.id, end, PartKind::Limb)?;
                controller.select(level, id)?;
                Ok(())
            }),
            Action::DeleteSelected => self.with_level(|level, controller| {
                let sel = controller.selection().ok_or(SessionError::NothingSelected)?;
                level.delete(sel.id)?;
                controller.clear();
                Ok(())
            }),
            Action::SetProperty(edit) => self.with_level(|level, controller| {
                let sel = controller.selection().ok_or(SessionError::NothingSelected)?;
                level.update_property(sel.id, edit)?;
                Ok(())
            }),
        };
        if let Err(err) = &result {
            tracing::warn!(%err, "action refused");
        }
        result
    }

    /// Drop all edits and go back to the level the session was opened with.
    pub fn reset_level(&mut self) -> Result<(), SessionError> {
        let mut level = self.baseline.clone();
        level.mark_dirty();
        let was_playing = self.mode() == Mode::Play;
        self.state = State::Edit { level };
        self.controller.clear();
        self.last_snapshot = None;
        self.accumulator = 0.0;
        tracing::info!(level_name = self.baseline.name(), "level reset");
        if was_playing {
            self.events.push(SessionEvent::ModeChanged(Mode::Edit));
        }
        self.flush_dirty();
        Ok(())
    }

    /// Read-only view of what to draw.
    pub fn frame(&self) -> Frame {
        match &self.state {
            State::Edit { level } => {
                let selected = self.controller.selection().map(|s| s.id);
                Frame::edit(level, selected, self.controller.handles(level))
            }
            State::Play { world, .. } => Frame::play(world),
        }
    }

    pub fn export_document(&self) -> Result<String, SessionError> {
        let level = self.level().ok_or(SessionError::NotInEditMode)?;
        Ok(LevelDocument::new(level.clone()).to_json()?)
    }

    /// Replace the level with a parsed document. It also becomes the level
    /// `ResetLevel` returns to.
    pub fn import_document(&mut self, json: &str) -> Result<(), SessionError> {
        if self.mode() != Mode::Edit {
            return Err(SessionError::NotInEditMode);
        }
        let level = LevelDocument::from_json(json)?.into_level();
        tracing::info!(level_name = level.name(), "imported level");
        self.baseline = level.clone();
        self.state = State::Edit { level };
        self.controller.clear();
        self.last_snapshot = None;
        self.flush_dirty();
        Ok(())
    }

    fn with_level<T>(
        &mut self,
        f: impl FnOnce(&mut Level, &mut GizmoController) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let State::Edit { level } = &mut self.state else {
            return Err(SessionError::NotInEditMode);
        };
        let result = f(level, &mut self.controller);
        self.flush_dirty();
        result
    }

    fn flush_dirty(&mut self) {
        if let State::Edit { level } = &mut self.state {
            level.drain_events();
            if level.take_dirty() {
                self.events.push(SessionEvent::Dirty);
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(mekanix_kernel::presets::default_level(), MekanixConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use mekanix_input::Tool;
    use mekanix_kernel::{PartEnd, PropertyEdit, presets};

    fn session() -> Session {
        Session::default()
    }

    #[test]
    fn starts_in_edit() {
        let s = session();
        assert_eq!(s.mode(), Mode::Edit);
        assert!(s.level().is_some());
        assert!(s.world().is_none());
        assert!(s.toolbar_visible());
        assert!(!s.gizmos_visible());
        assert!(s.snapshot().is_none());
    }

    #[test]
    fn play_holds_world_only() {
        let mut s = session();
        s.enter_play().unwrap();
        assert_eq!(s.mode(), Mode::Play);
        assert!(s.level().is_none());
        assert!(s.world().is_some());
        assert!(s.snapshot().is_some());
        assert!(!s.toolbar_visible());
        assert!(matches!(s.level_mut(), Err(SessionError::NotInEditMode)));
        assert_eq!(s.drain_events(), vec![SessionEvent::ModeChanged(Mode::Play)]);
    }

    #[test]
    fn repeated_transitions_are_noops() {
        let mut s = session();
        s.enter_edit().unwrap();
        assert!(s.events().is_empty());
        s.enter_play().unwrap();
        let id = s.snapshot().unwrap().id();
        s.enter_play().unwrap();
        assert_eq!(s.snapshot().unwrap().id(), id);
        assert_eq!(s.events().len(), 1);
    }

    #[test]
    fn entering_play_clears_selection() {
        let mut s = session();
        let root = s.level().unwrap().player().primary;
        let at = s.level().unwrap().part(root).unwrap().rect().to_world(Vec2::new(0.0, 30.0));
        s.pointer(PointerEvent::down(at)).unwrap();
        assert!(s.gizmos_visible());
        s.enter_play().unwrap();
        assert!(s.controller().selection().is_none());
        assert!(!s.controller().is_dragging());
    }

    #[test]
    fn restore_policy_returns_exact_level() {
        let mut s = session();
        let before = s.level().unwrap().clone();
        s.enter_play().unwrap();
        s.pointer(PointerEvent::down(Vec2::ZERO)).unwrap();
        for _ in 0..30 {
            s.advance(1.0 / 60.0);
        }
        s.enter_edit().unwrap();
        assert_eq!(s.level().unwrap(), &before);
        assert!(s.snapshot().is_some());
        assert!(s.drain_events().contains(&SessionEvent::ModeChanged(Mode::Edit)));
    }

    #[test]
    fn keep_simulated_moves_parts_but_keeps_ids() {
        let mut config = MekanixConfig::default();
        config.session.return_policy = ReturnPolicy::KeepSimulated;
        let mut s = Session::new(presets::default_level(), config);
        let before = s.level().unwrap().clone();
        s.enter_play().unwrap();
        for _ in 0..30 {
            s.advance(1.0 / 60.0);
        }
        s.enter_edit().unwrap();
        let after = s.level().unwrap();
        assert_eq!(after.entity_ids(), before.entity_ids());
        assert_eq!(after.next_id(), before.next_id());
        let root = before.player().primary;
        assert_ne!(after.part(root).unwrap().center, before.part(root).unwrap().center);
    }

    #[test]
    fn advance_is_capped_per_call() {
        let mut s = session();
        assert_eq!(s.advance(1.0), 0);
        s.enter_play().unwrap();
        assert_eq!(s.advance(1.0), 8);
        assert_eq!(s.world().unwrap().tick(), 8);
        assert_eq!(s.advance(1.0 / 60.0), 1);
        assert_eq!(s.advance(f32::NAN), 0);
        assert_eq!(s.advance(-1.0), 0);
    }

    #[test]
    fn play_pointer_drives_input() {
        let mut s = session();
        s.enter_play().unwrap();
        s.pointer(PointerEvent::down(Vec2::new(10.0, 10.0))).unwrap();
        assert!(s.world().unwrap().is_input_held());
        s.pointer(PointerEvent::moved(Vec2::new(20.0, 10.0))).unwrap();
        assert!(s.world().unwrap().is_input_held());
        s.pointer(PointerEvent::up(Vec2::new(20.0, 10.0))).unwrap();
        assert!(!s.world().unwrap().is_input_held());
    }

    #[test]
    fn toolbar_actions_edit_the_selection() {
        let mut s = session();
        s.apply(Action::AddPlatform(Vec2::new(200.0, 400.0))).unwrap();
        let platform = s.controller().selection().unwrap().id;
        assert!(s.drain_events().contains(&SessionEvent::Dirty));

        s.apply(Action::SetProperty(PropertyEdit::Width(300.0))).unwrap();
        assert_eq!(s.level().unwrap().platform(platform).unwrap().width, 300.0);

        s.apply(Action::DeleteSelected).unwrap();
        assert!(s.level().unwrap().platform(platform).is_none());
        assert!(matches!(
            s.apply(Action::DeleteSelected),
            Err(SessionError::NothingSelected)
        ));
    }

    #[test]
    fn add_connected_part_needs_a_part() {
        let mut s = session();
        let root = s.level().unwrap().player().primary;
        s.select(root).unwrap();
        s.apply(Action::AddConnectedPart(PartEnd::Tail)).unwrap();
        let child = s.controller().selection().unwrap().id;
        assert!(child > root);
        assert_eq!(s.level().unwrap().parts().len(), 3);

        let goal = s.level().unwrap().goal().id;
        s.select(goal).unwrap();
        assert!(matches!(
            s.apply(Action::AddConnectedPart(PartEnd::Head)),
            Err(SessionError::Level(LevelError::InvalidAnchor(_)))
        ));
    }

    #[test]
    fn edits_refused_in_play() {
        let mut s = session();
        s.apply(Action::TogglePlay).unwrap();
        assert!(matches!(
            s.apply(Action::AddPlatform(Vec2::ZERO)),
            Err(SessionError::NotInEditMode)
        ));
        assert!(matches!(s.export_document(), Err(SessionError::NotInEditMode)));
        s.apply(Action::SelectTool(Tool::Delete)).unwrap();
        assert_eq!(s.controller().tool(), Tool::Delete);
        s.apply(Action::TogglePlay).unwrap();
        assert_eq!(s.mode(), Mode::Edit);
    }

    #[test]
    fn reset_returns_to_baseline_from_either_mode() {
        let mut s = session();
        let baseline = s.level().unwrap().clone();
        s.apply(Action::AddPlatform(Vec2::new(100.0, 100.0))).unwrap();
        s.apply(Action::ResetLevel).unwrap();
        assert_eq!(s.level().unwrap(), &baseline);

        s.enter_play().unwrap();
        s.drain_events();
        s.apply(Action::ResetLevel).unwrap();
        assert_eq!(s.mode(), Mode::Edit);
        assert_eq!(s.level().unwrap(), &baseline);
        assert_eq!(s.events()[0], SessionEvent::ModeChanged(Mode::Edit));
    }

    #[test]
    fn document_export_import() {
        let mut s = session();
        s.apply(Action::AddPlatform(Vec2::new(100.0, 900.0))).unwrap();
        let json = s.export_document().unwrap();
        let edited = s.level().unwrap().clone();

        let mut other = Session::new(presets::flat(), MekanixConfig::default());
        other.import_document(&json).unwrap();
        assert_eq!(other.level().unwrap(), &edited);
        other.apply(Action::ResetLevel).unwrap();
        assert_eq!(other.level().unwrap(), &edited);
        assert!(matches!(
            other.import_document("{}"),
            Err(SessionError::Document(_))
        ));
    }

    #[test]
    fn frame_matches_mode() {
        let mut s = session();
        let root = s.level().unwrap().player().primary;
        s.select(root).unwrap();
        let frame = s.frame();
        assert_eq!(frame.mode, Mode::Edit);
        assert_eq!(frame.handles.len(), 5);
        assert_eq!(frame.highlight.unwrap().id, root);
        s.enter_play().unwrap();
        let frame = s.frame();
        assert_eq!(frame.mode, Mode::Play);
        assert!(frame.handles.is_empty());
    }
}
