//! Runs a scenario against the engine frame by frame.

use std::sync::Arc;

use glam::{Quat, Vec3};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;
use vwi_core::Transform;
use vwi_engine::{
    GizmoHandleId, InteractionError, InteractionEvent, InteractorId, StartDragParams, Transformable,
    WorldInteraction,
};

use crate::scenario::{Action, Grab, Scenario, ScenarioError};
use crate::scene::{ActorTransformable, SceneView, SharedScene, SimActor, create_shared_scene};
use crate::source::{Keyframe, ScriptedInteractor, SharedHand, sample_keyframes};

struct ScriptedHand {
    name: String,
    id: InteractorId,
    state: SharedHand,
    keyframes: Vec<Keyframe>,
}

/// Final state of one actor.
#[derive(Debug, Clone, Serialize)]
pub struct ActorReport {
    pub name: String,
    pub transform: Transform,
}

/// Outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub scenario: String,
    pub frames: u64,
    pub actors: Vec<ActorReport>,
    pub world_to_meters: f32,
    pub world_scale_version: u64,
    pub room_location: Vec3,
    pub drags_started: usize,
    pub moves_finished: usize,
    pub transactions_ended: usize,
    pub haptic_pulses: usize,
}

impl Report {
    pub fn actor(&self, name: &str) -> Option<&ActorReport> {
        self.actors.iter().find(|a| a.name == name)
    }
}

/// A scenario bound to a live engine and scene.
pub struct Simulation {
    scenario: Scenario,
    engine: WorldInteraction,
    scene: SharedScene,
    view: SceneView,
    hands: Vec<ScriptedHand>,
    events: Arc<Mutex<Vec<InteractionEvent>>>,
    simulating: bool,
    frame: u64,
}

impl Simulation {
    /// Builds the scene and registers the hands.
    pub fn new(scenario: Scenario) -> Result<Self, ScenarioError> {
        scenario.validate()?;
        let scene = create_shared_scene(scenario.floor_z);
        {
            let mut scene = scene.lock();
            for spec in &scenario.actors {
                scene.add_actor(SimActor {
                    name: spec.name.clone(),
                    transform: Transform::new(
                        Quat::from_rotation_z(spec.yaw_degrees.to_radians()),
                        spec.location,
                        Vec3::splat(spec.scale),
                    ),
                    half_extents: spec.half_extents,
                    hidden: spec.hidden,
                    editor_only: spec.editor_only,
                    selected: false,
                    simulated: spec.simulated,
                    velocity: Vec3::ZERO,
                });
            }
        }

        let mut engine = WorldInteraction::new(scenario.config.clone());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        engine.subscribe(move |event| sink.lock().push(event.clone()));

        let hands = scenario
            .hands
            .iter()
            .map(|spec| {
                let state = SharedHand::default();
                let source = ScriptedInteractor::new(spec.kind, state.clone(), spec.grabber_radius, spec.absolute_slide);
                let id = engine.add_interactor(Box::new(source));
                ScriptedHand {
                    name: spec.name.clone(),
                    id,
                    state,
                    keyframes: spec.keyframes.clone(),
                }
            })
            .collect();

        let mut simulation = Self {
            view: SceneView::new(scene.clone()),
            scenario,
            engine,
            scene,
            hands,
            events,
            simulating: false,
            frame: 0,
        };
        for (a, b) in simulation.scenario.pairs.clone() {
            let a = simulation.hand_id(&a)?;
            let b = simulation.hand_id(&b)?;
            simulation.engine.pair_interactors(a, b)?;
        }
        Ok(simulation)
    }

    /// The engine, for inspection between steps
    pub fn engine(&self) -> &WorldInteraction {
        &self.engine
    }

    /// Current frame number
    pub fn frame(&self) -> u64 {
        self.frame
    }

    fn hand_id(&self, name: &str) -> Result<InteractorId, ScenarioError> {
        self.hands
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.id)
            .ok_or_else(|| ScenarioError::UnknownHand(name.to_string()))
    }

    fn hand_state(&self, name: &str) -> Result<&SharedHand, ScenarioError> {
        self.hands
            .iter()
            .find(|h| h.name == name)
            .map(|h| &h.state)
            .ok_or_else(|| ScenarioError::UnknownHand(name.to_string()))
    }

    /// Runs one frame: poses, scheduled actions, then the engine tick.
    pub fn step(&mut self) -> Result<(), ScenarioError> {
        for hand in &self.hands {
            hand.state.lock().pose = sample_keyframes(&hand.keyframes, self.frame);
        }

        let actions: Vec<Action> = self
            .scenario
            .steps
            .iter()
            .filter(|s| s.frame == self.frame)
            .map(|s| s.action.clone())
            .collect();
        for action in actions {
            debug!(frame = self.frame, ?action, "running action");
            self.apply(action)?;
        }

        self.engine.tick(self.scenario.dt, &self.view);
        if self.simulating {
            self.scene.lock().step_physics(self.scenario.dt);
        }
        trace!(frame = self.frame, moving = self.engine.are_transformables_moving(), "tick");
        self.frame += 1;
        Ok(())
    }

    /// Runs every remaining frame and reports the end state.
    pub fn run(&mut self) -> Result<Report, ScenarioError> {
        info!(scenario = %self.scenario.name, frames = self.scenario.frames, "running scenario");
        while self.frame < self.scenario.frames {
            self.step()?;
        }
        let report = self.report();
        info!(
            scenario = %report.scenario,
            moves_finished = report.moves_finished,
            world_to_meters = report.world_to_meters,
            "scenario finished"
        );
        Ok(report)
    }

    fn apply(&mut self, action: Action) -> Result<(), ScenarioError> {
        match action {
            Action::Select(names) => {
                let ids = {
                    let scene = self.scene.lock();
                    names
                        .iter()
                        .map(|name| scene.find_by_name(name).ok_or_else(|| ScenarioError::UnknownActor(name.clone())))
                        .collect::<Result<Vec<Uuid>, _>>()?
                };
                self.select(&ids);
            }
            Action::ClearSelection => self.select(&[]),
            Action::StartDrag {
                hand,
                grab,
                laser_impact,
                placing,
                grabber_sphere,
            } => {
                let id = self.hand_id(&hand)?;
                let data = self
                    .engine
                    .interactor_data(id)
                    .ok_or(InteractionError::UnknownInteractor(id))?;
                let hit = data.hover_location.unwrap_or(data.transform.location());

                let mut params = StartDragParams::new(id, hit);
                match grab {
                    Grab::Free => {}
                    Grab::HoveredHandle => match data.hovered_handle {
                        Some(handle) => params = params.with_handle(handle),
                        None => warn!(hand = %hand, "no handle hovered, dragging freely"),
                    },
                    Grab::Handle(handle) => params = params.with_handle(GizmoHandleId(handle)),
                }
                if laser_impact {
                    params = params.at_laser_impact();
                }
                if placing {
                    params = params.placing_new_objects();
                }
                if grabber_sphere {
                    params = params.with_grabber_sphere();
                }
                self.engine.start_dragging(params)?;
            }
            Action::AssistDrag(hand) => {
                let id = self.hand_id(&hand)?;
                let hit = self
                    .engine
                    .interactor_data(id)
                    .map(|d| d.hover_location.unwrap_or(d.transform.location()))
                    .ok_or(InteractionError::UnknownInteractor(id))?;
                self.engine.start_assisting_drag(id, hit)?;
            }
            Action::WorldDrag(hand) => {
                let id = self.hand_id(&hand)?;
                self.engine.start_world_drag(id)?;
            }
            Action::StopDrag(hand) => {
                let id = self.hand_id(&hand)?;
                self.engine.stop_dragging(id)?;
            }
            Action::Slide { hand, delta } => {
                self.hand_state(&hand)?.lock().slide = Some(delta);
            }
            Action::CycleGizmoSpace => self.engine.cycle_gizmo_space(),
            Action::SetWorldScale {
                world_to_meters,
                compensate,
            } => self.engine.set_world_to_meters_scale(world_to_meters, compensate),
            Action::SetSimulating(simulating) => {
                self.simulating = simulating;
                self.engine.set_simulating(simulating);
            }
            Action::SelectionAsCandidates(enabled) => {
                self.engine.set_selection_as_candidates(enabled);
                if enabled {
                    self.scene.lock().set_selection(&[]);
                }
            }
        }
        Ok(())
    }

    fn select(&mut self, ids: &[Uuid]) {
        self.scene.lock().set_selection(ids);
        let transformables = ids
            .iter()
            .map(|id| Box::new(ActorTransformable::new(*id, self.scene.clone())) as Box<dyn Transformable>)
            .collect();
        self.engine.set_transformables(transformables);
    }

    /// Snapshot of the scene and engine.
    pub fn report(&self) -> Report {
        let events = self.events.lock();
        let count = |pred: fn(&InteractionEvent) -> bool| events.iter().filter(|e| pred(e)).count();
        let actors = self
            .scene
            .lock()
            .actors_by_name()
            .into_iter()
            .map(|(name, actor)| ActorReport {
                name: name.to_string(),
                transform: actor.transform,
            })
            .collect();

        Report {
            scenario: self.scenario.name.clone(),
            frames: self.frame,
            actors,
            world_to_meters: self.engine.world_to_meters(),
            world_scale_version: self.engine.world_scale_version(),
            room_location: self.engine.room_transform().location(),
            drags_started: count(|e| matches!(e, InteractionEvent::StartDragging { .. })),
            moves_finished: count(|e| matches!(e, InteractionEvent::FinishedMovingTransformables)),
            transactions_ended: count(|e| matches!(e, InteractionEvent::TransactionEnded)),
            haptic_pulses: self.hands.iter().map(|h| h.state.lock().haptic_pulses.len()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn run(ron: &str) -> Report {
        let scenario = Scenario::from_ron_str(ron).unwrap();
        Simulation::new(scenario).unwrap().run().unwrap()
    }

    #[test]
    fn test_axis_handle_drag_snaps_in_grid_steps() {
        let report = run(r#"(
            name: "axis snap",
            frames: 12,
            config: (
                snap: (grid_enabled: true, grid_size: 5.0),
                smoothing: (smooth_snap_enabled: false),
            ),
            actors: [(name: "crate", location: (0.0, 0.0, 0.0))],
            hands: [(name: "right", keyframes: [
                (frame: 0, location: (0.36, 0.0, 0.5), pitch_degrees: 90.0),
                (frame: 2, location: (0.36, 0.0, 0.5), pitch_degrees: 90.0),
                (frame: 3, location: (0.46, 0.0, 0.5), pitch_degrees: 90.0),
            ])],
            steps: [
                (frame: 0, action: Select(["crate"])),
                (frame: 1, action: StartDrag(hand: "right", grab: HoveredHandle)),
            ],
        )"#);
        let location = report.actor("crate").unwrap().transform.location();
        assert_relative_eq!(location.x, 10.0, epsilon = 1e-3);
        assert_relative_eq!(location.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(location.z, 0.0, epsilon = 1e-4);
        assert_eq!(report.drags_started, 1);
    }

    #[test]
    fn test_thrown_crate_coasts_and_finishes_once() {
        let report = run(r#"(
            name: "throw",
            frames: 300,
            floor_z: Some(0.0),
            actors: [(name: "crate", location: (0.0, 0.0, 0.0))],
            hands: [(name: "right", keyframes: [
                (frame: 1, location: (1.0, 0.0, 0.5), pitch_degrees: 90.0),
                (frame: 4, location: (1.06, 0.0, 0.5), pitch_degrees: 90.0),
            ])],
            steps: [
                (frame: 0, action: Select(["crate"])),
                (frame: 1, action: StartDrag(hand: "right")),
                (frame: 5, action: StopDrag("right")),
            ],
        )"#);
        let x = report.actor("crate").unwrap().transform.location().x;
        assert!(x > 16.0 && x < 46.0, "crate stopped at {x}");
        assert_eq!(report.moves_finished, 1);
        assert_eq!(report.transactions_ended, 1);
    }

    #[test]
    fn test_two_hand_world_spread_halves_scale() {
        let report = run(r#"(
            name: "world scale",
            frames: 8,
            hands: [
                (name: "left", keyframes: [
                    (frame: 2, location: (0.1, 0.0, 1.0)),
                    (frame: 3, location: (0.2, 0.0, 1.0)),
                ]),
                (name: "right", keyframes: [
                    (frame: 2, location: (-0.1, 0.0, 1.0)),
                    (frame: 3, location: (-0.2, 0.0, 1.0)),
                ]),
            ],
            pairs: [("left", "right")],
            steps: [
                (frame: 1, action: WorldDrag("left")),
                (frame: 1, action: WorldDrag("right")),
            ],
        )"#);
        assert_relative_eq!(report.world_to_meters, 50.0, epsilon = 1e-3);
        assert_eq!(report.world_scale_version, 1);
    }

    #[test]
    fn test_bundled_demos_run() {
        let demos = [
            include_str!("../../../demos/axis_snap.ron"),
            include_str!("../../../demos/throw.ron"),
            include_str!("../../../demos/world_scale.ron"),
            include_str!("../../../demos/place_on_floor.ron"),
        ];
        for demo in demos {
            let report = run(demo);
            assert!(report.frames > 0);
        }

        let config = vwi_core::InteractionConfig::from_ron_str(include_str!("../../../demos/snapping.config.ron"));
        assert!(config.is_ok());
    }

    #[test]
    fn test_unknown_names_are_errors() {
        let scenario = Scenario::from_ron_str(
            r#"(name: "bad", steps: [(frame: 0, action: Select(["ghost"]))])"#,
        )
        .unwrap();
        let mut simulation = Simulation::new(scenario).unwrap();
        assert!(matches!(simulation.step(), Err(ScenarioError::UnknownActor(name)) if name == "ghost"));

        let scenario = Scenario::from_ron_str(r#"(name: "bad", pairs: [("a", "b")])"#).unwrap();
        assert!(matches!(Simulation::new(scenario), Err(ScenarioError::UnknownHand(_))));
    }

    #[test]
    fn test_drag_without_selection_reports_engine_error() {
        let scenario = Scenario::from_ron_str(
            r#"(
                name: "nothing selected",
                hands: [(name: "right", keyframes: [(frame: 0, location: (0.0, 0.0, 1.0))])],
                steps: [(frame: 0, action: StartDrag(hand: "right"))],
            )"#,
        )
        .unwrap();
        let mut simulation = Simulation::new(scenario).unwrap();
        assert!(matches!(
            simulation.step(),
            Err(ScenarioError::Interaction(InteractionError::NoTransformables))
        ));
    }
}
