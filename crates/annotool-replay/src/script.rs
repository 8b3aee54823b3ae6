//! Gesture scripts: a starting scene plus a list of input steps.

use anyhow::{Context, bail};
use annotool_core::{
    AnnotationMode, Key, Modifiers, Scene, Shape, ShapeId, SimpleViewport, ToolBox, ToolConfig,
    ToolContext, ToolKind, TransformEvent, Viewport,
};
use glam::DVec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewportSetup {
    pub size: DVec2,
    pub zoom: f64,
    pub rotation: f64,
    pub center: Option<DVec2>,
}

impl Default for ViewportSetup {
    fn default() -> Self {
        Self {
            size: DVec2::new(800.0, 600.0),
            zoom: 1.0,
            rotation: 0.0,
            center: None,
        }
    }
}

/// One input step. Pointer positions are screen pixels.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Replaces the selection; indices refer to `Script::shapes`.
    Select { shapes: Vec<usize> },
    Activate { tool: ToolKind },
    Deactivate {
        #[serde(default = "finished_default")]
        finished: bool,
    },
    Mode { mode: AnnotationMode },
    Down {
        at: DVec2,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Drag {
        to: DVec2,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Up {
        at: DVec2,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Move { to: DVec2 },
    Key { key: Key },
    Zoom { zoom: f64 },
    Rotate { degrees: f64 },
}

fn finished_default() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Script {
    pub viewport: ViewportSetup,
    pub config: ToolConfig,
    pub shapes: Vec<Shape>,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Failed to parse gesture script")
    }
}

#[derive(Debug, Serialize)]
pub struct SceneEntry {
    pub id: ShapeId,
    pub shape: Shape,
}

/// State after the last step.
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub shapes: Vec<SceneEntry>,
    pub events: Vec<TransformEvent>,
    pub active_tool: Option<ToolKind>,
    pub instructions: Option<String>,
    pub view_rotation: f64,
    pub view_center: DVec2,
}

/// Runs every step against a fresh scene and tool box.
pub fn run(script: &Script) -> anyhow::Result<Outcome> {
    let setup = &script.viewport;
    let mut viewport = SimpleViewport::new(setup.size);
    viewport.set_zoom(setup.zoom);
    viewport.set_rotation(setup.rotation);
    if let Some(center) = setup.center {
        viewport.pan_to(center);
    }

    let mut scene = Scene::new();
    let ids: Vec<ShapeId> = script.shapes.iter().cloned().map(|shape| scene.add(shape)).collect();
    let mut toolbox = ToolBox::new(script.config.clone(), &mut viewport);
    let mut events = Vec::new();

    for (index, step) in script.steps.iter().enumerate() {
        tracing::debug!("[replay] step {}: {:?}", index, step);
        let mut ctx = ToolContext {
            scene: &mut scene,
            viewport: &mut viewport,
        };
        match step {
            Step::Select { shapes } => {
                ctx.scene.clear_selection();
                for i in shapes {
                    let Some(id) = ids.get(*i) else {
                        bail!("step {index}: no shape at index {i}");
                    };
                    ctx.scene.select(*id);
                }
                toolbox.selection_changed(&mut ctx);
            }
            Step::Activate { tool } => {
                if !toolbox.activate(&mut ctx, *tool) {
                    tracing::warn!("[replay] step {}: {} was not activated", index, tool.as_str());
                }
            }
            Step::Deactivate { finished } => toolbox.deactivate(&mut ctx, *finished),
            Step::Mode { mode } => toolbox.set_mode(&mut ctx, *mode),
            Step::Down { at, modifiers } => toolbox.pointer_down(&mut ctx, *at, *modifiers),
            Step::Drag { to, modifiers } => toolbox.pointer_move(&mut ctx, *to, *modifiers),
            Step::Up { at, modifiers } => toolbox.pointer_up(&mut ctx, *at, *modifiers),
            Step::Move { to } => toolbox.pointer_move(&mut ctx, *to, Modifiers::default()),
            Step::Key { key } => {
                toolbox.key_down(&mut ctx, *key);
            }
            Step::Zoom { zoom } => {
                if *zoom <= 0.0 {
                    bail!("step {index}: zoom must be positive, got {zoom}");
                }
                viewport.set_zoom(*zoom);
            }
            Step::Rotate { degrees } => ctx.viewport.set_rotation(*degrees),
        }
        events.extend(toolbox.take_transform_events());
    }

    let outcome = Outcome {
        shapes: scene
            .iter()
            .map(|(id, shape)| SceneEntry {
                id,
                shape: shape.clone(),
            })
            .collect(),
        events,
        active_tool: toolbox.active(),
        instructions: toolbox.instructions().map(str::to_owned),
        view_rotation: viewport.rotation(),
        view_center: viewport.center(),
    };
    toolbox.detach(&mut viewport);
    Ok(outcome)
}
