use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{error, info};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::config::ExplorerConfig;
use super::data::LineageData;
use super::expansion::ExpansionManager;
use super::render;
use super::state::ForceGraphState;
use super::surface::RenderSurface;

const FRAME_DT: f32 = 0.016;

type Explorer = ExpansionManager<ForceGraphState>;

fn pointer(
	canvas_ref: NodeRef<leptos::html::Canvas>,
	client_x: i32,
	client_y: i32,
) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((client_x as f64 - rect.left(), client_y as f64 - rect.top()))
}

#[component]
pub fn LineageGraphCanvas(
	#[prop(into)] data: Signal<LineageData>,
	#[prop(optional)] config: ExplorerConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Rc<RefCell<Option<Explorer>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let window: Window = web_sys::window().unwrap();

		let (w, h) = if fullscreen {
			(
				window.inner_width().unwrap().as_f64().unwrap(),
				window.inner_height().unwrap().as_f64().unwrap(),
			)
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

		// One manager per lineage payload; the click route below always
		// reaches whichever manager is current.
		let surface = ForceGraphState::new(w, h, &config);
		let explorer = data.get().into_manager(surface, config.clone());
		info!(
			"Lineage explorer ready with {} visible nodes",
			explorer.surface().node_ids().len()
		);
		*state_init.borrow_mut() = Some(explorer);

		if fullscreen && resize_cb_init.borrow().is_none() {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let win: Window = web_sys::window().unwrap();
				let (nw, nh) = (
					win.inner_width().unwrap().as_f64().unwrap(),
					win.inner_height().unwrap().as_f64().unwrap(),
				);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut m) = *state_resize.borrow_mut() {
					m.surface_mut().resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		if animate_init.borrow().is_some() {
			return;
		}
		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")
			.unwrap()
			.unwrap()
			.dyn_into()
			.unwrap();
		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut m) = *state_anim.borrow_mut() {
				m.surface_mut().tick(FRAME_DT);
				if m.has_deferred() {
					if let Err(err) = m.run_deferred() {
						error!("Auto-expand failed: {}", err);
					}
				}
				render::render(m.surface(), &ctx);
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				let _ = web_sys::window()
					.unwrap()
					.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		if let Some(ref mut m) = *state_md.borrow_mut() {
			m.surface_mut().begin_drag(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		if let Some(ref mut m) = *state_mm.borrow_mut() {
			m.surface_mut().pointer_moved(x, y);
		}
	};

	// The only route from user input into expand / collapse.
	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		let mut guard = state_mu.borrow_mut();
		let Some(m) = guard.as_mut() else {
			return;
		};
		if let Some(id) = m.surface_mut().end_drag() {
			if let Err(err) = m.on_node_click(&id) {
				error!("{}", err);
			}
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut m) = *state_ml.borrow_mut() {
			m.surface_mut().pointer_left();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		if let Some(ref mut m) = *state_wh.borrow_mut() {
			m.surface_mut().zoom_at(x, y, ev.delta_y());
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="lineage-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: pointer;"
		/>
	}
}
