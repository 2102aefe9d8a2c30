//! Frame compositing for animated sources.
//!
//! Animated containers store frames incrementally: each frame only covers
//! the region that changed, and a disposal tag says what to do with the
//! canvas afterwards. Resizing those partial frames directly would produce
//! garbage, so every frame is first resolved against a running canvas:
//!
//! ```text
//! for each frame:
//!     draw frame over canvas at (left, top)
//!     emit fit_width(canvas)
//!     Carry → keep canvas        (Keep, Previous)
//!     Reset → fresh empty canvas (Background)
//! ```
//!
//! "Restore to previous" is approximated by carrying the canvas forward,
//! and "restore to background" clears to transparent rather than to the
//! source's background colour.

use super::frames::{Animation, Disposal, Frame};
use super::resize::fit_width;
use crate::cancel::{CancelToken, Cancelled};
use image::RgbaImage;
use image::imageops;

/// Canvas transition applied after a frame has been emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasState {
    Carry,
    Reset,
}

impl From<Disposal> for CanvasState {
    fn from(disposal: Disposal) -> Self {
        match disposal {
            Disposal::Keep | Disposal::Previous => CanvasState::Carry,
            Disposal::Background => CanvasState::Reset,
        }
    }
}

/// Running canvas for one target resolution.
pub struct Compositor {
    canvas: RgbaImage,
    max_width: u32,
}

impl Compositor {
    pub fn new(width: u32, height: u32, max_width: u32) -> Self {
        Self {
            canvas: RgbaImage::new(width, height),
            max_width,
        }
    }

    /// Draw `frame`, emit the resized canvas, then apply the frame's disposal.
    pub fn step(&mut self, frame: &Frame) -> RgbaImage {
        imageops::overlay(
            &mut self.canvas,
            &frame.raster,
            i64::from(frame.left),
            i64::from(frame.top),
        );
        let resolved = fit_width(&self.canvas, self.max_width).into_owned();

        if CanvasState::from(frame.disposal) == CanvasState::Reset {
            let (width, height) = self.canvas.dimensions();
            self.canvas = RgbaImage::new(width, height);
        }

        resolved
    }
}

/// Resolve every frame of `animation` into a full raster at most `max_width` wide.
///
/// The output has exactly one raster per source frame, in order.
pub fn resolve_frames(
    animation: &Animation,
    max_width: u32,
    cancel: &CancelToken,
) -> Result<Vec<RgbaImage>, Cancelled> {
    let (width, height) = animation.canvas_dimensions();
    let mut compositor = Compositor::new(width, height, max_width);

    animation
        .frames
        .iter()
        .map(|frame| {
            cancel.check()?;
            Ok(compositor.step(frame))
        })
        .collect()
}

/// Resolve `animation` at `max_width` into a rendition-ready animation.
///
/// Every output frame is a full canvas at the origin. Delay and loop count
/// pass through, disposal is [collapsed](Disposal::collapsed).
pub fn render_animation(
    animation: &Animation,
    max_width: u32,
    cancel: &CancelToken,
) -> Result<Animation, Cancelled> {
    let rasters = resolve_frames(animation, max_width, cancel)?;
    let frames = rasters
        .into_iter()
        .zip(&animation.frames)
        .map(|(raster, source)| Frame {
            raster,
            left: 0,
            top: 0,
            delay_ms: source.delay_ms,
            disposal: source.disposal.collapsed(),
        })
        .collect();

    Ok(Animation {
        repeat: animation.repeat,
        frames,
    })
}

/// Full-size canvas of a one-frame animation, for treating it as a still.
pub fn flatten(animation: &Animation) -> Option<RgbaImage> {
    let first = animation.frames.first()?;
    let (width, height) = animation.canvas_dimensions();
    Some(Compositor::new(width, height, u32::MAX).step(first))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::frames::Repeat;
    use image::Rgba;

    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn frame(w: u32, h: u32, left: u32, top: u32, colour: Rgba<u8>, disposal: Disposal) -> Frame {
        Frame {
            raster: RgbaImage::from_pixel(w, h, colour),
            left,
            top,
            delay_ms: 100,
            disposal,
        }
    }

    fn animation(frames: Vec<Frame>) -> Animation {
        Animation {
            repeat: Repeat::Infinite,
            frames,
        }
    }

    #[test]
    fn disposal_drives_canvas_state() {
        assert_eq!(CanvasState::from(Disposal::Keep), CanvasState::Carry);
        assert_eq!(CanvasState::from(Disposal::Previous), CanvasState::Carry);
        assert_eq!(CanvasState::from(Disposal::Background), CanvasState::Reset);
    }

    #[test]
    fn partial_frame_is_drawn_over_carried_canvas() {
        let anim = animation(vec![
            frame(4, 4, 0, 0, RED, Disposal::Keep),
            frame(2, 2, 2, 2, BLUE, Disposal::Keep),
        ]);
        let frames = resolve_frames(&anim, 100, &CancelToken::new()).unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].dimensions(), (4, 4));
        assert!(frames[0].pixels().all(|p| *p == RED));

        // Golden: red everywhere except the bottom-right quadrant
        assert_eq!(frames[1].get_pixel(0, 0), &RED);
        assert_eq!(frames[1].get_pixel(1, 3), &RED);
        assert_eq!(frames[1].get_pixel(2, 2), &BLUE);
        assert_eq!(frames[1].get_pixel(3, 3), &BLUE);
    }

    #[test]
    fn background_disposal_resets_after_emitting() {
        let anim = animation(vec![
            frame(4, 4, 0, 0, RED, Disposal::Background),
            frame(2, 2, 0, 0, BLUE, Disposal::Keep),
        ]);
        let frames = resolve_frames(&anim, 100, &CancelToken::new()).unwrap();

        // The disposing frame itself is still shown in full
        assert!(frames[0].pixels().all(|p| *p == RED));
        // The next frame starts from an empty canvas
        assert_eq!(frames[1].get_pixel(0, 0), &BLUE);
        assert_eq!(frames[1].get_pixel(3, 3), &CLEAR);
    }

    #[test]
    fn previous_disposal_carries_canvas_forward() {
        let anim = animation(vec![
            frame(4, 4, 0, 0, RED, Disposal::Keep),
            frame(2, 2, 0, 0, BLUE, Disposal::Previous),
            frame(1, 1, 3, 3, BLUE, Disposal::Keep),
        ]);
        let frames = resolve_frames(&anim, 100, &CancelToken::new()).unwrap();

        // Blue from frame 1 is still present in frame 2
        assert_eq!(frames[2].get_pixel(0, 0), &BLUE);
        assert_eq!(frames[2].get_pixel(3, 3), &BLUE);
        assert_eq!(frames[2].get_pixel(3, 0), &RED);
    }

    #[test]
    fn transparent_pixels_do_not_erase_canvas() {
        let mut holey = RgbaImage::from_pixel(4, 4, BLUE);
        holey.put_pixel(1, 1, CLEAR);
        let anim = animation(vec![
            frame(4, 4, 0, 0, RED, Disposal::Keep),
            Frame {
                raster: holey,
                left: 0,
                top: 0,
                delay_ms: 100,
                disposal: Disposal::Keep,
            },
        ]);
        let frames = resolve_frames(&anim, 100, &CancelToken::new()).unwrap();
        assert_eq!(frames[1].get_pixel(1, 1), &RED);
        assert_eq!(frames[1].get_pixel(0, 0), &BLUE);
    }

    #[test]
    fn frames_outside_canvas_are_clipped() {
        let anim = animation(vec![
            frame(4, 4, 0, 0, RED, Disposal::Keep),
            frame(4, 4, 2, 2, BLUE, Disposal::Keep),
        ]);
        let frames = resolve_frames(&anim, 100, &CancelToken::new()).unwrap();
        assert_eq!(frames[1].dimensions(), (4, 4));
        assert_eq!(frames[1].get_pixel(3, 3), &BLUE);
    }

    #[test]
    fn every_frame_is_resized_to_target() {
        let anim = animation(vec![
            frame(200, 100, 0, 0, RED, Disposal::Keep),
            frame(50, 50, 10, 10, BLUE, Disposal::Background),
            frame(20, 20, 0, 0, BLUE, Disposal::Keep),
        ]);
        let frames = resolve_frames(&anim, 100, &CancelToken::new()).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.dimensions() == (100, 50)));
    }

    #[test]
    fn render_animation_passes_metadata_through() {
        let mut anim = animation(vec![
            frame(300, 150, 0, 0, RED, Disposal::Previous),
            frame(10, 10, 5, 5, BLUE, Disposal::Background),
        ]);
        anim.repeat = Repeat::Finite(2);
        anim.frames[1].delay_ms = 250;

        let out = render_animation(&anim, 100, &CancelToken::new()).unwrap();
        assert_eq!(out.repeat, Repeat::Finite(2));
        assert_eq!(out.canvas_dimensions(), (100, 50));
        assert_eq!(out.frames[0].disposal, Disposal::Keep);
        assert_eq!(out.frames[1].disposal, Disposal::Background);
        assert_eq!(out.frames[1].delay_ms, 250);
        assert!(out.frames.iter().all(|f| f.left == 0 && f.top == 0));
    }

    #[test]
    fn flatten_single_frame_keeps_full_size() {
        let anim = animation(vec![frame(700, 20, 0, 0, RED, Disposal::Background)]);
        let still = flatten(&anim).unwrap();
        assert_eq!(still.dimensions(), (700, 20));
        assert!(still.pixels().all(|p| *p == RED));
    }

    #[test]
    fn flatten_empty_animation_is_none() {
        assert!(flatten(&animation(Vec::new())).is_none());
    }

    #[test]
    fn cancelled_token_stops_compositing() {
        let anim = animation(vec![frame(4, 4, 0, 0, RED, Disposal::Keep)]);
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(resolve_frames(&anim, 100, &token), Err(Cancelled));
    }
}
