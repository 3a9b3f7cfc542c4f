//! Metric encoders: node metrics to marker colour and radius.
//!
//! Every function here is total. Missing, negative and non-finite inputs are
//! read as zero.

use std::fmt;

use super::types::NodeMetrics;

/// Up to this failure ratio the red channel ramps up; green stays full.
const AMBER_START: f64 = 0.1;
/// From this failure ratio on markers are pure red.
const RED_START: f64 = 0.2;
const DURATION_OFFSET: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
	pub red: u8,
	pub green: u8,
	pub blue: u8,
}

impl Rgb {
	/// Marker fill used when colour encoding is off.
	pub const NEUTRAL: Rgb = Rgb::new(0x1f, 0x77, 0xb4);

	pub const fn new(red: u8, green: u8, blue: u8) -> Self {
		Self { red, green, blue }
	}
}

impl fmt::Display for Rgb {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "rgb({}, {}, {})", self.red, self.green, self.blue)
	}
}

fn sanitize(value: Option<f64>) -> f64 {
	match value {
		Some(v) if v.is_finite() && v > 0.0 => v,
		_ => 0.0,
	}
}

fn channel(value: f64) -> u8 {
	value.floor().clamp(0.0, 255.0) as u8
}

/// `failure / (failure + success + 1)`; the `+1` keeps empty nodes healthy.
pub fn failure_ratio(metrics: &NodeMetrics) -> f64 {
	let failure = sanitize(metrics.failure_n);
	let success = sanitize(metrics.success_n);
	failure / (failure + success + 1.0)
}

pub fn color_for_failure_ratio(ratio: f64) -> Rgb {
	let ratio = if ratio.is_finite() { ratio.max(0.0) } else { 0.0 };
	let red = if ratio > AMBER_START {
		255
	} else {
		channel(255.0 / AMBER_START * ratio)
	};
	let green = if ratio < AMBER_START {
		255
	} else if ratio < RED_START {
		channel(255.0 * (RED_START - ratio) / (RED_START - AMBER_START))
	} else {
		0
	};
	Rgb::new(red, green, 0)
}

pub fn color_for_metrics(metrics: &NodeMetrics) -> Rgb {
	color_for_failure_ratio(failure_ratio(metrics))
}

/// `ceil(sqrt(avg_duration + 10))`, so an idle node still gets radius 4.
pub fn radius_for_duration(avg_duration: Option<f64>) -> f64 {
	(sanitize(avg_duration) + DURATION_OFFSET).sqrt().ceil()
}
