//! UltraCanvas Core
//!
//! Foundational primitives shared by every other crate:
//!
//! - **Geometry & color**: integer/float points and rects, RGBA colors, gradients
//! - **Styles**: drawing and text styles carried by the render state
//! - **Render context**: the abstract 2D drawing surface and its state stack
//! - **Recording context**: a backend that records commands instead of drawing
//! - **Text layout**: measurement, wrapping and alignment
//! - **Events**: the neutral event record and X11-aligned key codes
//!
//! # Example
//!
//! ```rust
//! use uc_core::{Color, Rect2Df, RecordingContext, RenderContext};
//!
//! let mut ctx = RecordingContext::new(320, 240);
//! ctx.set_fill_color(Color::RED);
//! ctx.fill_rectangle(Rect2Df::new(10.0, 10.0, 100.0, 30.0));
//! assert_eq!(ctx.commands().len(), 1);
//! ```

pub mod color;
pub mod error;
pub mod events;
pub mod geometry;
pub mod gradient;
pub mod recording;
pub mod render;
pub mod style;
pub mod text;
pub mod transform;

pub use color::{Color, Hsv};
pub use error::{CoreError, Result};
pub use events::{
    DragDropData, EventType, KeyCode, Modifiers, MouseButton, UcEvent, UserPayload, WindowId,
};
pub use geometry::{Insets, Point2D, Point2Df, Point2Di, Rect2D, Rect2Df, Rect2Di, Scalar};
pub use gradient::{Gradient, GradientKind, GradientStop};
pub use recording::{DrawCommand, RecordedCommand, RecordingContext};
pub use render::{PixelSnapshot, RenderContext, RenderState, StateStack};
pub use style::{
    DashPattern, DrawingStyle, FillMode, FontSlant, FontWeight, LineCap, LineJoin, StrokeStyle,
    TextAlign, TextBaseline, TextStyle,
};
pub use text::{
    set_text_measurer, text_measurer, EstimatedTextMeasurer, LaidOutLine, TextBlock, TextLayout,
    TextLayoutOptions, TextMeasurer, TextMetrics, DEFAULT_DPI,
};
pub use transform::Affine2D;
