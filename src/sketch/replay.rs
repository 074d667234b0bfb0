use crate::sketch::model::{PaintMode, Point};
use crate::sketch::session::SketchSession;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Recorded pointer input, replayed through a session as if a user drew it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StrokeScript {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub strokes: Vec<ScriptStroke>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptStroke {
    #[serde(default)]
    pub mode: PaintMode,
    pub points: Vec<Point>,
    /// End the stroke with a pointer leave instead of a release.
    #[serde(default)]
    pub leave: bool,
}

impl StrokeScript {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read stroke script {}", path.display()))?;
        let script: StrokeScript = serde_json::from_str(&content)
            .with_context(|| format!("deserialize stroke script {}", path.display()))?;
        if script.width == 0 || script.height == 0 {
            bail!("stroke script surface must be non-empty");
        }
        Ok(script)
    }

    pub fn replay(&self, session: &mut SketchSession) {
        for stroke in &self.strokes {
            let Some((first, rest)) = stroke.points.split_first() else {
                continue;
            };
            session.set_mode(stroke.mode);
            session.pointer_down(*first);
            session.pointer_move(*first);
            for point in rest {
                session.pointer_move(*point);
            }
            if stroke.leave {
                session.pointer_leave();
            } else {
                session.pointer_up();
            }
        }
    }
}
