//! Engine canvas
//!
//! `IcedSurface` adapts an iced canvas `Frame` to the engine's vector
//! surface. `EngineCanvas` is the canvas program that renders one engine
//! frame whenever its cache has been invalidated by a repaint request.

use std::cell::RefCell;

use iced::widget::canvas::{self, Cache, Frame, Geometry, Path, Program, Stroke, Text};
use iced::{mouse, Color, Point, Rectangle, Size, Theme};
use modhost_core::audio::CpalPlatform;
use modhost_core::render::{LineCap, LineJoin, Rgba, VectorSurface, Viewport, WindowMetrics};
use modhost_core::Host;

use super::app::Message;
use crate::demo::DemoEngine;

pub type AppHost = Host<DemoEngine, CpalPlatform>;

fn to_color(color: Rgba) -> Color {
    Color::from_rgba(color.r, color.g, color.b, color.a)
}

/// Vector surface drawing into an iced canvas frame
pub struct IcedSurface<'f> {
    frame: &'f mut Frame,
    size: (f32, f32),
    line_cap: canvas::LineCap,
    line_join: canvas::LineJoin,
    letter_spacing: f32,
}

impl<'f> IcedSurface<'f> {
    pub fn new(frame: &'f mut Frame) -> Self {
        let size = frame.size();
        Self {
            frame,
            size: (size.width, size.height),
            line_cap: canvas::LineCap::default(),
            line_join: canvas::LineJoin::default(),
            letter_spacing: 0.0,
        }
    }
}

impl VectorSurface for IcedSurface<'_> {
    fn set_viewport(&mut self, viewport: Viewport) {
        // iced sizes the frame to the widget bounds already
        log::trace!("viewport {}x{}", viewport.width, viewport.height);
    }

    fn clear(&mut self, color: Rgba) {
        if color.a > 0.0 {
            let size = self.frame.size();
            self.frame.fill_rectangle(Point::ORIGIN, size, to_color(color));
        }
    }

    fn begin_frame(&mut self, width: f32, height: f32, _pixel_ratio: f32) {
        self.size = (width, height);
    }

    fn end_frame(&mut self) {}

    fn frame_size(&self) -> (f32, f32) {
        self.size
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.line_cap = match cap {
            LineCap::Butt => canvas::LineCap::Butt,
            LineCap::Round => canvas::LineCap::Round,
            LineCap::Square => canvas::LineCap::Square,
        };
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.line_join = match join {
            LineJoin::Miter => canvas::LineJoin::Miter,
            LineJoin::Round => canvas::LineJoin::Round,
            LineJoin::Bevel => canvas::LineJoin::Bevel,
        };
    }

    fn set_letter_spacing(&mut self, spacing: f32) {
        // canvas text has no tracking control; kept for the engine's layout math
        self.letter_spacing = spacing;
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba) {
        self.frame
            .fill_rectangle(Point::new(x, y), Size::new(width, height), to_color(color));
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgba) {
        let path = Path::line(Point::new(from.0, from.1), Point::new(to.0, to.1));
        let stroke = Stroke {
            line_cap: self.line_cap,
            line_join: self.line_join,
            ..Stroke::default()
        }
        .with_color(to_color(color))
        .with_width(width);
        self.frame.stroke(&path, stroke);
    }

    fn fill_text(&mut self, x: f32, y: f32, text: &str, size: f32, color: Rgba) {
        self.frame.fill_text(Text {
            content: text.to_string(),
            position: Point::new(x, y),
            size: size.into(),
            color: to_color(color),
            ..Text::default()
        });
    }
}

/// Canvas program rendering engine frames
pub struct EngineCanvas<'a> {
    pub host: &'a RefCell<AppHost>,
    pub cache: &'a Cache,
    pub pixel_ratio: f32,
}

impl Program<Message> for EngineCanvas<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let geometry = self.cache.draw(renderer, bounds.size(), |frame| {
            let window = WindowMetrics::new(bounds.width, bounds.height, self.pixel_ratio);
            // Canvas-local logical position scaled to the physical pixels the
            // frame renderer divides back out
            let pointer = cursor
                .position_in(bounds)
                .map(|p| (p.x * self.pixel_ratio, p.y * self.pixel_ratio));
            let mut host = self.host.borrow_mut();
            let pointer = pointer.unwrap_or_else(|| {
                let last = host.pointer();
                (last.x as f32 * self.pixel_ratio, last.y as f32 * self.pixel_ratio)
            });
            let mut surface = IcedSurface::new(frame);
            host.render_frame(&window, pointer, Some(&mut surface));
        });
        vec![geometry]
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if cursor.is_over(bounds) {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::default()
        }
    }
}
