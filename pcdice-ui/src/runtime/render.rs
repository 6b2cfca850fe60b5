//! Rendering: FPS throttle and frame rendering.

use std::time::Instant;

use super::{AppRuntime, FRAME};
use crate::ui::{Frame, RatatuiBackend, RenderBuf, SessionView};

impl AppRuntime {
    /// Render at ~60fps if needed.
    pub(crate) fn maybe_render(&mut self, backend: &mut RatatuiBackend) -> std::io::Result<()> {
        let now = Instant::now();
        if now.duration_since(self.last_render_time) < FRAME {
            return Ok(());
        }

        // Progress bar moves every frame while running
        if self.engine.is_animating() {
            self.render_needed = true;
        }

        // Re-render while a message is visible (for auto-dismiss)
        if self.app_frame.status_bar.current().is_some() || self.engine.surface().error.is_some() {
            self.render_needed = true;
        }

        if !self.render_needed {
            return Ok(());
        }

        self.last_render_time = now;

        let view = SessionView::capture(&self.engine);
        let mut frame = backend.begin_frame()?;
        let area = frame.area();
        {
            let mut buf = RenderBuf::new(frame.buffer_mut());
            self.app_frame.render_buf(area, &mut buf, &view);
            if Frame::is_size_ok(area) {
                self.panes.render(Frame::content_area(area), &mut buf, &view);
            }
        }
        backend.end_frame(frame)?;

        self.render_needed = false;
        Ok(())
    }
}
