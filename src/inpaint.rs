//! Fast-marching inpainting.
//!
//! Masked pixels are filled in order of their distance from the mask boundary,
//! so each pixel is estimated only from pixels that are already known. The
//! front is advanced with a min-heap on arrival time (the eikonal solution of
//! `|grad T| = 1`). Two estimators share the march:
//!
//! - **Telea**: weighted average of known neighbours within the radius, weighted
//!   by distance, level-set proximity and alignment with the front normal, plus a
//!   first-order gradient correction.
//! - **Navier-Stokes**: weighted average that favours neighbours lying along the
//!   local isophote, so edges hitting the hole are continued into it.
//!
//! Only masked pixels are ever written.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::str::FromStr;

use image::{GrayImage, ImageBuffer, Pixel};

use crate::error::{Error, Result};

const KNOWN: u8 = 0;
const BAND: u8 = 1;
const INSIDE: u8 = 2;

/// Arrival time of pixels the front has not reached yet.
const FAR: f32 = 1.0e6;

/// Telea: minimum direction factor so tangential neighbours still count a little.
const MIN_DIRECTION: f32 = 1.0e-6;

/// Navier-Stokes: weight floor for neighbours across the isophote.
const ISOPHOTE_FLOOR: f32 = 0.05;

/// Default neighbourhood radius in pixels.
pub const DEFAULT_RADIUS: u32 = 3;

/// Pixel synthesis strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InpaintMethod {
    /// Telea's fast marching method (`"telea"`).
    #[default]
    Telea,
    /// Fluid-dynamics style isophote continuation (`"ns"`).
    NavierStokes,
}

impl InpaintMethod {
    /// Short name accepted by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Telea => "telea",
            Self::NavierStokes => "ns",
        }
    }
}

impl fmt::Display for InpaintMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InpaintMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "telea" => Ok(Self::Telea),
            "ns" => Ok(Self::NavierStokes),
            other => Err(Error::invalid(format!(
                "unknown inpainting method '{other}', expected 'telea' or 'ns'"
            ))),
        }
    }
}

/// Inpaint every pixel where `mask` is non-zero.
///
/// Works on any 8-bit pixel layout; all channels (alpha included) are
/// synthesized. Pixels where `mask` is zero are copied unchanged. A mask that
/// covers the whole image has no boundary to march from and leaves the image
/// as it was.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if the mask size differs from the image
/// or `radius` is zero.
pub fn inpaint<P>(
    image: &ImageBuffer<P, Vec<u8>>,
    mask: &GrayImage,
    radius: u32,
    method: InpaintMethod,
) -> Result<ImageBuffer<P, Vec<u8>>>
where
    P: Pixel<Subpixel = u8>,
{
    if image.dimensions() != mask.dimensions() {
        return Err(Error::invalid(format!(
            "mask is {}x{} but image is {}x{}",
            mask.width(),
            mask.height(),
            image.width(),
            image.height()
        )));
    }
    if radius == 0 {
        return Err(Error::invalid("inpainting radius must be at least 1"));
    }

    let (width, height) = image.dimensions();
    let mut pixels = image.as_raw().clone();
    let mut march = FastMarch::new(width as usize, height as usize, mask);
    log::debug!(
        "inpainting {width}x{height} ({method}, radius {radius}), {} boundary pixels",
        march.heap.len()
    );
    march.run(
        &mut pixels,
        usize::from(P::CHANNEL_COUNT),
        radius as usize,
        method,
    );

    ImageBuffer::from_raw(width, height, pixels)
        .ok_or_else(|| Error::internal("inpainted buffer does not match image size"))
}

/// Entry in the narrow-band heap.
#[derive(Debug, Clone, Copy)]
struct Front {
    time: f32,
    index: usize,
}

impl PartialEq for Front {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Front {}

impl PartialOrd for Front {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Front {
    // reversed: BinaryHeap pops the earliest arrival first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.index.cmp(&self.index))
    }
}

/// A known pixel contributing to an estimate.
#[derive(Debug, Clone, Copy)]
struct Tap {
    index: usize,
    /// Offset from the tap to the pixel being filled.
    rx: f32,
    ry: f32,
    weight: f32,
}

struct FastMarch {
    width: usize,
    height: usize,
    flags: Vec<u8>,
    time: Vec<f32>,
    heap: BinaryHeap<Front>,
}

impl FastMarch {
    fn new(width: usize, height: usize, mask: &GrayImage) -> Self {
        let flags: Vec<u8> = mask
            .as_raw()
            .iter()
            .map(|&m| if m == 0 { KNOWN } else { INSIDE })
            .collect();
        let time = flags
            .iter()
            .map(|&f| if f == INSIDE { FAR } else { 0.0 })
            .collect();

        let mut march = Self {
            width,
            height,
            flags,
            time,
            heap: BinaryHeap::new(),
        };

        // known pixels touching the hole seed the front
        for index in 0..march.flags.len() {
            if march.flags[index] != KNOWN {
                continue;
            }
            let borders_hole = march
                .neighbours(index)
                .into_iter()
                .flatten()
                .any(|n| march.flags[n] == INSIDE);
            if borders_hole {
                march.flags[index] = BAND;
                march.heap.push(Front { time: 0.0, index });
            }
        }
        march
    }

    /// 4-neighbours as `[up, down, left, right]`.
    fn neighbours(&self, index: usize) -> [Option<usize>; 4] {
        let (x, y) = (index % self.width, index / self.width);
        [
            (y > 0).then(|| index - self.width),
            (y + 1 < self.height).then(|| index + self.width),
            (x > 0).then(|| index - 1),
            (x + 1 < self.width).then(|| index + 1),
        ]
    }

    fn known(&self, n: Option<usize>) -> Option<usize> {
        n.filter(|&i| self.flags[i] != INSIDE)
    }

    fn run(&mut self, pixels: &mut [u8], channels: usize, radius: usize, method: InpaintMethod) {
        let span = radius.saturating_mul(2).saturating_add(1);
        let mut taps = Vec::with_capacity(span.min(self.width) * span.min(self.height));

        while let Some(Front { index, .. }) = self.heap.pop() {
            self.flags[index] = KNOWN;

            for next in self.neighbours(index).into_iter().flatten() {
                if self.flags[next] != INSIDE {
                    continue;
                }
                let [up, down, left, right] = self.neighbours(next);
                let time = self
                    .solve(up, left)
                    .min(self.solve(down, left))
                    .min(self.solve(up, right))
                    .min(self.solve(down, right));
                self.time[next] = time;

                self.collect_taps(next, pixels, channels, radius, method, &mut taps);
                self.fill(next, pixels, channels, method, &taps);

                self.flags[next] = BAND;
                self.heap.push(Front { time, index: next });
            }
        }
    }

    /// Upwind solution of the eikonal equation from two orthogonal neighbours.
    fn solve(&self, a: Option<usize>, b: Option<usize>) -> f32 {
        let arrival = |n| self.known(n).map(|i| self.time[i]);
        match (arrival(a), arrival(b)) {
            (Some(t1), Some(t2)) => {
                let diff = t1 - t2;
                let disc = 2.0 - diff * diff;
                if disc > 0.0 {
                    (t1 + t2 + disc.sqrt()) * 0.5
                } else {
                    1.0 + t1.min(t2)
                }
            }
            (Some(t), None) | (None, Some(t)) => 1.0 + t,
            (None, None) => FAR,
        }
    }

    /// Gradient of `value` at `index`, using only known neighbours.
    fn gradient(&self, index: usize, value: impl Fn(usize) -> f32) -> (f32, f32) {
        let [up, down, left, right] = self.neighbours(index);
        let centre = value(index);
        let diff = |lo: Option<usize>, hi: Option<usize>| match (self.known(lo), self.known(hi)) {
            (Some(l), Some(h)) => (value(h) - value(l)) * 0.5,
            (Some(l), None) => centre - value(l),
            (None, Some(h)) => value(h) - centre,
            (None, None) => 0.0,
        };
        (diff(left, right), diff(up, down))
    }

    #[allow(clippy::cast_precision_loss)]
    fn collect_taps(
        &self,
        index: usize,
        pixels: &[u8],
        channels: usize,
        radius: usize,
        method: InpaintMethod,
        taps: &mut Vec<Tap>,
    ) {
        taps.clear();
        let (qx, qy) = (index % self.width, index / self.width);
        let front_normal = self.gradient(index, |i| self.time[i]);
        let colour_channels = channels.min(3);
        let intensity = |i: usize| {
            let base = i * channels;
            let sum: f32 = pixels[base..base + colour_channels]
                .iter()
                .map(|&v| f32::from(v))
                .sum();
            sum / colour_channels as f32
        };

        // scan window clipped to the image
        let (x0, x1) = (
            qx.saturating_sub(radius),
            qx.saturating_add(radius).min(self.width - 1),
        );
        let (y0, y1) = (
            qy.saturating_sub(radius),
            qy.saturating_add(radius).min(self.height - 1),
        );
        let r2 = radius.saturating_mul(radius);

        for ky in y0..=y1 {
            for kx in x0..=x1 {
                let (dx, dy) = (kx.abs_diff(qx), ky.abs_diff(qy));
                if (dx == 0 && dy == 0) || dx * dx + dy * dy > r2 {
                    continue;
                }
                let k = ky * self.width + kx;
                if self.flags[k] == INSIDE {
                    continue;
                }

                let (rx, ry) = (qx as f32 - kx as f32, qy as f32 - ky as f32);
                let dist2 = rx * rx + ry * ry;
                let weight = match method {
                    InpaintMethod::Telea => {
                        let dst = 1.0 / (dist2 * dist2.sqrt());
                        let lev = 1.0 / (1.0 + (self.time[k] - self.time[index]).abs());
                        let mut dir = rx * front_normal.0 + ry * front_normal.1;
                        if dir.abs() <= 0.01 {
                            dir = MIN_DIRECTION;
                        }
                        (dst * lev * dir).abs()
                    }
                    InpaintMethod::NavierStokes => {
                        let (gx, gy) = self.gradient(k, intensity);
                        let norm2 = gx * gx + gy * gy;
                        let along = if norm2 > 1.0e-6 {
                            // isophote direction is (-gy, gx)
                            (ry * gx - rx * gy).abs() / (dist2.sqrt() * norm2.sqrt())
                        } else {
                            1.0
                        };
                        (along + ISOPHOTE_FLOOR) / dist2
                    }
                };
                taps.push(Tap {
                    index: k,
                    rx,
                    ry,
                    weight,
                });
            }
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn fill(
        &self,
        index: usize,
        pixels: &mut [u8],
        channels: usize,
        method: InpaintMethod,
        taps: &[Tap],
    ) {
        for c in 0..channels {
            let estimate = {
                let sample = |i: usize| f32::from(pixels[i * channels + c]);
                let mut num = 0.0f32;
                let mut den = 0.0f32;
                for tap in taps {
                    let value = match method {
                        InpaintMethod::Telea => {
                            let (gx, gy) = self.gradient(tap.index, sample);
                            sample(tap.index) + gx * tap.rx + gy * tap.ry
                        }
                        InpaintMethod::NavierStokes => sample(tap.index),
                    };
                    num += tap.weight * value;
                    den += tap.weight;
                }
                if den > 0.0 {
                    Some(num / den)
                } else {
                    None
                }
            };
            if let Some(v) = estimate {
                pixels[index * channels + c] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}
