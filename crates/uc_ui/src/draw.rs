//! Free drawing helpers routed to the current render context
//!
//! Each helper resolves the context through
//! [`get_render_context`](crate::context_manager::get_render_context) and is
//! a no-op when none is available.

use uc_core::{Color, Point2Df, Rect2Df, TextMetrics};

use crate::context_manager::with_render_context;

pub fn push_state() {
    with_render_context(|ctx| ctx.push_state());
}

pub fn pop_state() {
    with_render_context(|ctx| ctx.pop_state());
}

pub fn translate(dx: f32, dy: f32) {
    with_render_context(|ctx| ctx.translate(dx, dy));
}

pub fn set_clip_rect(rect: Rect2Df) {
    with_render_context(|ctx| ctx.set_clip_rect(rect));
}

pub fn clear_clip_rect() {
    with_render_context(|ctx| ctx.clear_clip_rect());
}

pub fn set_fill_color(color: Color) {
    with_render_context(|ctx| ctx.set_fill_color(color));
}

pub fn set_stroke_color(color: Color) {
    with_render_context(|ctx| ctx.set_stroke_color(color));
}

pub fn set_stroke_width(width: f32) {
    with_render_context(|ctx| ctx.set_stroke_width(width));
}

pub fn set_font(family: &str, size: f32) {
    with_render_context(|ctx| ctx.set_font(family, size));
}

pub fn set_text_color(color: Color) {
    with_render_context(|ctx| ctx.set_text_color(color));
}

pub fn set_global_alpha(alpha: f32) {
    with_render_context(|ctx| ctx.set_global_alpha(alpha));
}

pub fn draw_line(start: Point2Df, end: Point2Df) {
    with_render_context(|ctx| ctx.draw_line(start, end));
}

pub fn draw_rectangle(rect: Rect2Df) {
    with_render_context(|ctx| ctx.draw_rectangle(rect));
}

pub fn fill_rectangle(rect: Rect2Df) {
    with_render_context(|ctx| ctx.fill_rectangle(rect));
}

pub fn draw_rounded_rectangle(rect: Rect2Df, radius: f32) {
    with_render_context(|ctx| ctx.draw_rounded_rectangle(rect, radius));
}

pub fn fill_rounded_rectangle(rect: Rect2Df, radius: f32) {
    with_render_context(|ctx| ctx.fill_rounded_rectangle(rect, radius));
}

pub fn draw_circle(center: Point2Df, radius: f32) {
    with_render_context(|ctx| ctx.draw_circle(center, radius));
}

pub fn fill_circle(center: Point2Df, radius: f32) {
    with_render_context(|ctx| ctx.fill_circle(center, radius));
}

pub fn draw_text(text: &str, position: Point2Df) {
    with_render_context(|ctx| ctx.draw_text(text, position));
}

pub fn draw_text_in_rect(text: &str, rect: Rect2Df) {
    with_render_context(|ctx| ctx.draw_text_in_rect(text, rect));
}

/// Zero metrics without a context
pub fn measure_text(text: &str) -> TextMetrics {
    with_render_context(|ctx| ctx.measure_text(text)).unwrap_or_default()
}

pub fn draw_image(path: &str, position: Point2Df) {
    with_render_context(|ctx| ctx.draw_image(path, position));
}

pub fn draw_image_in_rect(path: &str, dest: Rect2Df) {
    with_render_context(|ctx| ctx.draw_image_in_rect(path, dest));
}

pub fn clear(color: Color) {
    with_render_context(|ctx| ctx.clear(color));
}
