use std::path::Path;

use cairo::{Context as CairoContext, Format, ImageSurface};

use crate::error::CanvasError;

pub const WIDTH: i32 = 500;
pub const HEIGHT: i32 = 500;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    Translate(f64, f64),
    Rotate(f64),
    Scale(f64, f64),
}

impl Transform {
    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        match *self {
            Transform::Translate(tx, ty) => (x + tx, y + ty),
            Transform::Rotate(theta) => (
                x * theta.cos() - y * theta.sin(),
                y * theta.cos() + x * theta.sin(),
            ),
            Transform::Scale(sx, sy) => (x * sx, y * sy),
        }
    }

    /// Merges `other` into `self` in place if they are the same kind,
    /// summing their parameters — the adjacent-merge rule.
    fn try_merge(&mut self, other: Transform) -> bool {
        match (self, other) {
            (Transform::Translate(x, y), Transform::Translate(dx, dy)) => {
                *x += dx;
                *y += dy;
                true
            }
            (Transform::Rotate(theta), Transform::Rotate(dtheta)) => {
                *theta += dtheta;
                true
            }
            (Transform::Scale(x, y), Transform::Scale(dx, dy)) => {
                *x += dx;
                *y += dy;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Color {
        Color { r, g, b, a: 1.0 }
    }

    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Color {
        Color { r, g, b, a }
    }

    pub fn cmyk(c: f64, m: f64, y: f64, k: f64) -> Color {
        Color {
            r: (1.0 - c) * (1.0 - k),
            g: (1.0 - m) * (1.0 - k),
            b: (1.0 - y) * (1.0 - k),
            a: 1.0,
        }
    }
}

/// Standard HSL(A) -> RGB(A) conversion; `h` in degrees, `s`/`l`/`a` in
/// [0, 1]. Used by the `H` statement, which converts before handing the
/// result to `Canvas::set_color`, so the canvas itself only ever deals in
/// rgb/rgba/cmyk (see SPEC_FULL.md §3).
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (l, l, l);
    }
    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;
    let h = (h.rem_euclid(360.0)) / 360.0;
    let hue_to_rgb = |p: f64, q: f64, mut t: f64| -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    };
    (
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

/// Abstract drawing surface the interpreter drives. Kept as a trait so
/// tests can substitute a recording double instead of rasterizing.
pub trait Canvas {
    fn set_color(&mut self, color: Color);
    fn set_cursor(&mut self, x: f64, y: f64);
    fn clear_transforms(&mut self);
    fn pop_transform(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, theta: f64);
    fn scale(&mut self, sx: f64, sy: f64);
    fn dot(&mut self);
    fn line(&mut self);
    fn save(&self, path: &Path) -> Result<(), CanvasError>;
}

/// The shipped rasterizer: a 500x500 RGBA surface backed by `cairo-rs`.
pub struct CairoCanvas {
    surface: ImageSurface,
    transforms: Vec<Transform>,
    color: Color,
    cursor: (f64, f64),
    last_point: (f64, f64),
}

impl CairoCanvas {
    pub fn new() -> Result<Self, CanvasError> {
        let surface = ImageSurface::create(Format::ARgb32, WIDTH, HEIGHT)
            .map_err(|e| CanvasError::Surface(format!("{:?}", e)))?;
        Ok(CairoCanvas {
            surface,
            transforms: Vec::new(),
            color: Color::BLACK,
            cursor: (0.0, 0.0),
            last_point: (0.0, 0.0),
        })
    }

    /// Composes the transform stack top-to-bottom in registration order and
    /// adds the logical cursor, matching the canvas both x and y coordinate
    /// correctly (the source's `get_cursor` reused the x component for both
    /// axes; this does not reproduce that).
    fn transformed_cursor(&self) -> (f64, f64) {
        let mut pos = (0.0, 0.0);
        for t in &self.transforms {
            pos = t.apply(pos.0, pos.1);
        }
        (pos.0 + self.cursor.0, pos.1 + self.cursor.1)
    }

    fn push_transform(&mut self, t: Transform) {
        if let Some(top) = self.transforms.last_mut() {
            if top.try_merge(t) {
                return;
            }
        }
        self.transforms.push(t);
    }

    fn with_context<F>(&mut self, f: F)
    where
        F: FnOnce(&CairoContext),
    {
        let cr = CairoContext::new(&self.surface);
        f(&cr);
    }
}

impl Canvas for CairoCanvas {
    fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    fn set_cursor(&mut self, x: f64, y: f64) {
        self.cursor = (x, y);
    }

    fn clear_transforms(&mut self) {
        self.transforms.clear();
    }

    fn pop_transform(&mut self) {
        self.transforms.pop();
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.push_transform(Transform::Translate(x, y));
    }

    fn rotate(&mut self, theta: f64) {
        self.push_transform(Transform::Rotate(theta));
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.push_transform(Transform::Scale(sx, sy));
    }

    fn dot(&mut self) {
        let (x, y) = self.transformed_cursor();
        let color = self.color;
        self.with_context(|cr| {
            cr.set_source_rgba(color.r, color.g, color.b, color.a);
            cr.arc(x, y, 0.5, 0.0, std::f64::consts::PI * 2.0);
            cr.fill();
        });
        self.last_point = (x, y);
    }

    fn line(&mut self) {
        let (x, y) = self.transformed_cursor();
        let (from_x, from_y) = self.last_point;
        let color = self.color;
        self.with_context(|cr| {
            cr.set_source_rgba(color.r, color.g, color.b, color.a);
            cr.move_to(from_x, from_y);
            cr.line_to(x, y);
            cr.stroke();
        });
        self.last_point = (x, y);
    }

    fn save(&self, path: &Path) -> Result<(), CanvasError> {
        let mut file = std::fs::File::create(path)?;
        self.surface
            .write_to_png(&mut file)
            .map_err(|e| CanvasError::Surface(format!("{:?}", e)))
    }
}

#[cfg(test)]
pub mod recording {
    use super::*;

    /// Test double logging every call instead of rasterizing, per
    /// SPEC_FULL.md's test-tooling section.
    #[derive(Debug, Default)]
    pub struct RecordingCanvas {
        pub calls: Vec<String>,
        pub color: Option<Color>,
        pub cursor: (f64, f64),
        pub transforms: Vec<Transform>,
        pub dots: Vec<(f64, f64)>,
    }

    impl RecordingCanvas {
        pub fn new() -> Self {
            RecordingCanvas::default()
        }

        fn transformed_cursor(&self) -> (f64, f64) {
            let mut pos = (0.0, 0.0);
            for t in &self.transforms {
                pos = t.apply(pos.0, pos.1);
            }
            (pos.0 + self.cursor.0, pos.1 + self.cursor.1)
        }
    }

    impl Canvas for RecordingCanvas {
        fn set_color(&mut self, color: Color) {
            self.calls.push(format!("set_color({:?})", color));
            self.color = Some(color);
        }

        fn set_cursor(&mut self, x: f64, y: f64) {
            self.calls.push(format!("set_cursor({}, {})", x, y));
            self.cursor = (x, y);
        }

        fn clear_transforms(&mut self) {
            self.calls.push("clear_transforms".into());
            self.transforms.clear();
        }

        fn pop_transform(&mut self) {
            self.calls.push("pop_transform".into());
            self.transforms.pop();
        }

        fn translate(&mut self, x: f64, y: f64) {
            self.calls.push(format!("translate({}, {})", x, y));
            if let Some(Transform::Translate(tx, ty)) = self.transforms.last_mut() {
                *tx += x;
                *ty += y;
            } else {
                self.transforms.push(Transform::Translate(x, y));
            }
        }

        fn rotate(&mut self, theta: f64) {
            self.calls.push(format!("rotate({})", theta));
            if let Some(Transform::Rotate(t)) = self.transforms.last_mut() {
                *t += theta;
            } else {
                self.transforms.push(Transform::Rotate(theta));
            }
        }

        fn scale(&mut self, sx: f64, sy: f64) {
            self.calls.push(format!("scale({}, {})", sx, sy));
            if let Some(Transform::Scale(x, y)) = self.transforms.last_mut() {
                *x += sx;
                *y += sy;
            } else {
                self.transforms.push(Transform::Scale(sx, sy));
            }
        }

        fn dot(&mut self) {
            let p = self.transformed_cursor();
            self.calls.push(format!("dot at {:?}", p));
            self.dots.push(p);
        }

        fn line(&mut self) {
            let p = self.transformed_cursor();
            self.calls.push(format!("line to {:?}", p));
        }

        fn save(&self, _path: &Path) -> Result<(), CanvasError> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::recording::RecordingCanvas;
    use super::*;

    #[test]
    fn adjacent_translates_merge() {
        let mut c = RecordingCanvas::new();
        c.translate(1.0, 2.0);
        c.translate(3.0, 4.0);
        assert_eq!(c.transforms, vec![Transform::Translate(4.0, 6.0)]);
    }

    #[test]
    fn pop_removes_the_whole_merged_frame() {
        let mut c = RecordingCanvas::new();
        c.translate(1.0, 2.0);
        c.translate(3.0, 4.0);
        c.pop_transform();
        assert!(c.transforms.is_empty());
    }

    #[test]
    fn dot_uses_both_axes_of_the_cursor() {
        let mut c = RecordingCanvas::new();
        c.set_cursor(10.0, 20.0);
        c.dot();
        assert_eq!(c.dots, vec![(10.0, 20.0)]);
    }

    #[test]
    fn hsl_bright_cyan_green() {
        let (r, g, b) = hsl_to_rgb(150.0, 1.0, 0.5);
        assert!(r < 0.1);
        assert!(g > 0.9);
        assert!(b > 0.4 && b < 0.6);
    }
}
