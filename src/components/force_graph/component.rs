use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use log::{debug, error, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent, Window};

use super::render;
use super::scene::{LABEL_FONT, estimate_text_width};
use super::state::ForceGraphState;
use super::types::{ForceGraphConfig, GraphDocument};

type Shared<T> = Rc<RefCell<Option<T>>>;

/// A `window` event listener that unregisters itself when dropped, so the
/// browser never calls into a freed closure.
struct WindowListener {
	event: &'static str,
	callback: Closure<dyn FnMut()>,
}

impl WindowListener {
	fn new(window: &Window, event: &'static str, callback: impl FnMut() + 'static) -> Option<Self> {
		let callback = Closure::<dyn FnMut()>::new(callback);
		window
			.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
			.ok()?;
		Some(Self { event, callback })
	}
}

impl Drop for WindowListener {
	fn drop(&mut self) {
		if let Some(window) = web_sys::window() {
			let _ = window
				.remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
		}
		debug!("Removed window {} listener", self.event);
	}
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn canvas_point(canvas: &HtmlCanvasElement, client_x: i32, client_y: i32) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(client_x as f64 - rect.left(), client_y as f64 - rect.top())
}

fn touch_point(canvas: &HtmlCanvasElement, ev: &TouchEvent) -> Option<(f64, f64)> {
	let touch = ev.touches().get(0)?;
	Some(canvas_point(canvas, touch.client_x(), touch.client_y()))
}

#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<GraphDocument>,
	#[prop(default = ForceGraphConfig::call_graph())] config: ForceGraphConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Shared<ForceGraphState> = Rc::new(RefCell::new(None));
	let animate: Shared<Closure<dyn FnMut()>> = Rc::new(RefCell::new(None));
	let resize_listener: Shared<WindowListener> = Rc::new(RefCell::new(None));
	let running = Arc::new(AtomicBool::new(true));
	let (load_error, set_load_error) = signal(None::<String>);
	let (state_init, animate_init, resize_init, running_init) =
		(state.clone(), animate.clone(), resize_listener.clone(), running.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			error!("Canvas has no 2d context");
			set_load_error.set(Some("Canvas has no 2d context".into()));
			return;
		};

		let mut graph = match ForceGraphState::initialize(&data.get(), w, h, config) {
			Ok(graph) => graph,
			Err(err) => {
				error!("Force graph failed to start: {err}");
				set_load_error.set(Some(err.to_string()));
				*state_init.borrow_mut() = None;
				return;
			}
		};
		set_load_error.set(None);
		let measure_ctx = ctx.clone();
		graph.set_text_measure(move |text| {
			measure_ctx.set_font(LABEL_FONT);
			measure_ctx
				.measure_text(text)
				.map(|metrics| metrics.width())
				.unwrap_or_else(|_| estimate_text_width(text))
		});
		graph.on_tick(move |frame| render::render(frame, &ctx));
		*state_init.borrow_mut() = Some(graph);

		if fullscreen && resize_init.borrow().is_none() {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_init.borrow_mut() = WindowListener::new(&window, "resize", move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					if let Err(err) = s.resize(nw, nh) {
						warn!("Ignoring resize: {err}");
					}
				}
			});
		}

		// A re-run only swaps the state; the frame loop keeps going.
		if animate_init.borrow().is_some() {
			return;
		}
		// The loop holds the resize listener too: after unmount it drops both on
		// its last frame, detaching the listener before its closure is freed.
		let (state_anim, animate_inner, resize_anim, running_anim) = (
			state_init.clone(),
			animate_init.clone(),
			resize_init.clone(),
			running_init.clone(),
		);
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if !running_anim.load(Ordering::Relaxed) {
				resize_anim.borrow_mut().take();
				state_anim.borrow_mut().take();
				return;
			}
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick();
			}
			if let (Some(cb), Some(window)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	on_cleanup(move || running.store(false, Ordering::Relaxed));

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = canvas_point(&canvas, ev.client_x(), ev.client_y());
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pointer_down(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = canvas_point(&canvas, ev.client_x(), ev.client_y());
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(x, y);
			canvas.set_title(s.hover_tooltip().unwrap_or(""));
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.pointer_up();
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_cancel();
		}
		if let Some(canvas) = canvas_ref.get() {
			canvas.set_title("");
		}
	};

	let state_cl = state.clone();
	let on_click = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = canvas_point(&canvas, ev.client_x(), ev.client_y());
		if let Some(ref mut s) = *state_cl.borrow_mut() {
			s.click(x, y);
		}
	};

	// Touch input suppresses the synthetic click, so a tap that misses every
	// marker is treated as a label click right away.
	let state_ts = state.clone();
	let on_touchstart = move |ev: TouchEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let Some((x, y)) = touch_point(&canvas, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_ts.borrow_mut() {
			if !s.pointer_down(x, y) {
				s.click(x, y);
			}
		}
	};

	let state_tm = state.clone();
	let on_touchmove = move |ev: TouchEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let Some((x, y)) = touch_point(&canvas, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_tm.borrow_mut() {
			s.pointer_move(x, y);
		}
	};

	let state_te = state.clone();
	let on_touchend = move |_: TouchEvent| {
		if let Some(ref mut s) = *state_te.borrow_mut() {
			s.pointer_up();
		}
	};

	let state_tc = state;
	let on_touchcancel = move |_: TouchEvent| {
		if let Some(ref mut s) = *state_tc.borrow_mut() {
			s.pointer_cancel();
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:click=on_click
			on:touchstart=on_touchstart
			on:touchmove=on_touchmove
			on:touchend=on_touchend
			on:touchcancel=on_touchcancel
			style="display: block; cursor: grab;"
		/>
		{move || load_error.get().map(|err| view! { <p class="force-graph-error">{err}</p> })}
	}
}
