use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::ev;
use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	Blob, BlobPropertyBag, CanvasRenderingContext2d, Element, File, FileReader, HtmlAnchorElement,
	HtmlCanvasElement, HtmlInputElement, MouseEvent, Url, Window,
};

use super::config::EditorConfig;
use super::controller::{EditorStatus, InteractionController};
use super::error::CanvasError;
use super::render;
use super::types::{DataPatch, Node, NodeKind, NodePatch, Point};

/// Shared handle between DOM callbacks. The controller lives on the UI thread
/// only; `status` mirrors it for the reactive overlay.
#[derive(Clone)]
struct Editor {
	controller: Rc<RefCell<InteractionController>>,
	status: RwSignal<EditorStatus>,
}

impl Editor {
	fn new(config: EditorConfig) -> Self {
		let controller = InteractionController::new(config);
		let status = RwSignal::new(controller.status());
		Self {
			controller: Rc::new(RefCell::new(controller)),
			status,
		}
	}

	/// Runs `f` against the controller, then publishes the new status if it changed.
	fn apply<R>(&self, f: impl FnOnce(&mut InteractionController) -> R) -> R {
		let (out, status) = {
			let mut ctl = self.controller.borrow_mut();
			let out = f(&mut ctl);
			(out, ctl.status())
		};
		if self.status.with_untracked(|current| *current != status) {
			self.status.set(status);
		}
		out
	}

	fn on_click<F>(&self, f: F) -> impl Fn(MouseEvent) + 'static + use<F>
	where
		F: Fn(&mut InteractionController) + 'static,
	{
		let editor = self.clone();
		move |_| editor.apply(|ctl| f(ctl))
	}
}

fn client_point(ev: &MouseEvent) -> Point {
	Point::new(ev.client_x() as f64, ev.client_y() as f64)
}

fn canvas_origin(canvas_ref: NodeRef<leptos::html::Canvas>) -> Option<Point> {
	canvas_ref.get_untracked().map(|canvas| {
		let rect = canvas.get_bounding_client_rect();
		Point::new(rect.left(), rect.top())
	})
}

fn measure(
	canvas: &HtmlCanvasElement,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
) -> (f64, f64) {
	if fullscreen {
		let window = web_sys::window();
		let dim = |v: Option<Result<JsValue, JsValue>>, fallback| {
			v.and_then(Result::ok).and_then(|v| v.as_f64()).unwrap_or(fallback)
		};
		return (
			dim(window.as_ref().map(Window::inner_width), 800.0),
			dim(window.as_ref().map(Window::inner_height), 600.0),
		);
	}
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
}

/// Reactive text derived from the selected node, empty when nothing is selected.
fn selected_text(
	status: RwSignal<EditorStatus>,
	f: fn(&Node) -> String,
) -> impl Fn() -> String + Send + Sync + Copy + 'static {
	move || status.with(|s| s.selected.as_ref().map(f).unwrap_or_default())
}

/// Keys typed into form fields belong to the field, not the canvas.
fn typing_in_field(ev: &web_sys::KeyboardEvent) -> bool {
	ev.target()
		.and_then(|t| t.dyn_into::<Element>().ok())
		.is_some_and(|el| matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT"))
}

/// Picks up a bundle another page left in session storage, then forgets it.
fn import_pending_bundle(editor: &Editor, key: &str) {
	let Some(storage) = web_sys::window().and_then(|w| w.session_storage().ok().flatten()) else {
		return;
	};
	let Ok(Some(raw)) = storage.get_item(key) else {
		return;
	};
	let _ = storage.remove_item(key);
	let imported = serde_json::from_str::<serde_json::Value>(&raw)
		.map_err(CanvasError::MalformedBundle)
		.and_then(|bundle| editor.apply(|ctl| ctl.import_bundle(&bundle)));
	if let Err(err) = imported {
		warn!("discarding stored import bundle: {err}");
	}
}

fn download(bytes: Vec<u8>) -> Result<(), JsValue> {
	let text = String::from_utf8(bytes).map_err(|e| JsValue::from_str(&e.to_string()))?;
	let options = BlobPropertyBag::new();
	options.set_type("application/json");
	let parts = js_sys::Array::of1(&JsValue::from_str(&text));
	let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
	let url = Url::create_object_url_with_blob(&blob)?;

	let document = web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| JsValue::from_str("no document"))?;
	let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
	anchor.set_href(&url);
	anchor.set_download(&format!("canvas-{}.json", chrono::Utc::now().timestamp_millis()));
	anchor.click();
	Url::revoke_object_url(&url)
}

fn save(editor: &Editor) {
	match editor.controller.borrow().save_snapshot() {
		Ok(bytes) => {
			let size = bytes.len();
			match download(bytes) {
				Ok(()) => info!("saved snapshot ({size} bytes)"),
				Err(err) => warn!("snapshot download failed: {err:?}"),
			}
		}
		Err(err) => warn!("{err}"),
	}
}

/// Reads `file` as text and loads it. The live graph is only replaced after a full parse.
fn read_snapshot(file: File, editor: Editor) {
	let reader = match FileReader::new() {
		Ok(reader) => reader,
		Err(err) => {
			warn!("cannot create file reader: {err:?}");
			return;
		}
	};
	let result_reader = reader.clone();
	let onload = Closure::once_into_js(move || {
		let Some(text) = result_reader.result().ok().and_then(|v| v.as_string()) else {
			warn!("snapshot file is not text");
			return;
		};
		if let Err(err) = editor.apply(|ctl| ctl.load_snapshot(text.as_bytes())) {
			warn!("load failed, canvas unchanged: {err}");
		}
	});
	reader.set_onload(Some(onload.unchecked_ref()));
	if let Err(err) = reader.read_as_text(&file) {
		warn!("cannot read snapshot file: {err:?}");
	}
}

/// Graph editor: a zoomable canvas with toolbar, node menu, properties panel and status bar.
#[component]
pub fn InvestigationCanvas(
	#[prop(optional)] config: EditorConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let import_key = config.import_storage_key.clone();
	let editor = Editor::new(config);
	let status = editor.status;
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let size = Rc::new(Cell::new((800.0, 600.0)));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let alive = Arc::new(AtomicBool::new(true));

	let (editor_init, size_init, alive_init) = (editor.clone(), size.clone(), alive.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let Some(window) = web_sys::window() else {
			return;
		};
		let (w, h) = measure(&canvas, fullscreen, width, height);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		size_init.set((w, h));

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("2d canvas context unavailable");
			return;
		};
		import_pending_bundle(&editor_init, &import_key);

		let (controller, size_anim, alive_anim, animate_inner) = (
			editor_init.controller.clone(),
			size_init.clone(),
			alive_init.clone(),
			animate.clone(),
		);
		*animate.borrow_mut() = Some(Closure::new(move || {
			if !alive_anim.load(Ordering::Relaxed) {
				return;
			}
			let (w, h) = size_anim.get();
			render::render(&controller.borrow(), &ctx, w, h);
			if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	// Drags and pans continue outside the canvas, so move/up are tracked on the window.
	let editor_mm = editor.clone();
	let on_mousemove = window_event_listener(ev::mousemove, move |ev| {
		let origin = canvas_origin(canvas_ref);
		editor_mm.apply(|ctl| ctl.pointer_move(client_point(&ev), origin));
	});
	let editor_mu = editor.clone();
	let on_mouseup = window_event_listener(ev::mouseup, move |_| {
		editor_mu.apply(InteractionController::pointer_up);
	});
	let editor_kd = editor.clone();
	let on_keydown = window_event_listener(ev::keydown, move |ev| {
		if !typing_in_field(&ev) {
			editor_kd.apply(|ctl| ctl.key_down(&ev.key()));
		}
	});
	let size_rs = size.clone();
	let on_resize = window_event_listener(ev::resize, move |_| {
		if let Some(canvas) = canvas_ref.get_untracked() {
			let (w, h) = measure(&canvas, fullscreen, width, height);
			canvas.set_width(w as u32);
			canvas.set_height(h as u32);
			size_rs.set((w, h));
		}
	});
	on_cleanup(move || {
		alive.store(false, Ordering::Relaxed);
		for handle in [on_mousemove, on_mouseup, on_keydown, on_resize] {
			handle.remove();
		}
	});

	let editor_md = editor.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		ev.prevent_default();
		let origin = canvas_origin(canvas_ref);
		let clicks = ev.detail().max(1) as u32;
		editor_md.apply(|ctl| ctl.pointer_down(client_point(&ev), origin, clicks));
	};

	let editor_wh = editor.clone();
	let on_wheel = move |ev: web_sys::WheelEvent| {
		ev.prevent_default();
		let origin = canvas_origin(canvas_ref);
		editor_wh.apply(|ctl| ctl.wheel(client_point(&ev), origin, ev.delta_y()));
	};

	let (editor_label, editor_desc, editor_kind, editor_load, editor_save) = (
		editor.clone(),
		editor.clone(),
		editor.clone(),
		editor.clone(),
		editor.clone(),
	);

	let menu_buttons = NodeKind::ALL
		.into_iter()
		.map(|kind| {
			view! {
				<button
					class="node-menu-item"
					style:border-left=format!("4px solid {}", kind.color())
					on:click=editor.on_click(move |ctl| {
						ctl.choose_node_kind(kind);
					})
				>
					{kind.label()}
				</button>
			}
		})
		.collect_view();

	let kind_options = NodeKind::ALL
		.into_iter()
		.map(|kind| view! { <option value=kind.key()>{kind.label()}</option> })
		.collect_view();

	view! {
		<div class="investigation-canvas" style="position: relative; width: 100%; height: 100%;">
			<div class="toolbar" style="position: absolute; top: 8px; left: 8px;">
				<button on:click=editor.on_click(InteractionController::zoom_out)>"−"</button>
				<span class="zoom">{move || format!("{}%", status.get().zoom_percent)}</span>
				<button on:click=editor.on_click(InteractionController::zoom_in)>"+"</button>
				<button on:click=editor.on_click(InteractionController::reset_view)>"Reset"</button>
				<button
					class:active=move || status.get().connecting
					on:click=editor.on_click(InteractionController::toggle_connecting)
				>
					"Connect"
				</button>
				<label class="button">
					"Load"
					<input
						type="file"
						accept=".json,application/json"
						style="display: none;"
						on:change=move |ev| {
							let Some(input) = ev
								.target()
								.and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
							else {
								return;
							};
							if let Some(file) = input.files().and_then(|files| files.get(0)) {
								read_snapshot(file, editor_load.clone());
							}
							input.set_value("");
						}
					/>
				</label>
				<button on:click=move |_| save(&editor_save)>"Save"</button>
			</div>

			<canvas
				node_ref=canvas_ref
				class="investigation-canvas-surface"
				on:mousedown=on_mousedown
				on:wheel=on_wheel
				style="display: block;"
				style:cursor=move || if status.get().connecting { "crosshair" } else { "grab" }
			/>

			<div
				class="node-menu"
				style="position: absolute;"
				style:display=move || if status.get().menu_at.is_some() { "flex" } else { "none" }
				style:left=move || status.get().menu_at.map(|p| format!("{}px", p.x)).unwrap_or_default()
				style:top=move || status.get().menu_at.map(|p| format!("{}px", p.y)).unwrap_or_default()
			>
				{menu_buttons}
				<button class="node-menu-cancel" on:click=editor.on_click(InteractionController::close_menu)>
					"Cancel"
				</button>
			</div>

			<div
				class="properties"
				style="position: absolute; top: 0; right: 0;"
				style:display=move || if status.get().selected.is_some() { "block" } else { "none" }
			>
				<div class="properties-header">
					<h3>"Node Properties"</h3>
					<button on:click=editor.on_click(InteractionController::close_properties)>"×"</button>
				</div>
				<label>"Label"</label>
				<input
					type="text"
					prop:value=selected_text(status, |n| n.data.label.clone())
					on:input=move |ev| {
						let label = event_target_value(&ev);
						editor_label
							.apply(|ctl| ctl.update_selected(NodePatch::data(DataPatch::label(label))));
					}
				/>
				<label>"Description"</label>
				<textarea
					prop:value=selected_text(status, |n| n.data.description.clone())
					on:input=move |ev| {
						let description = event_target_value(&ev);
						editor_desc.apply(|ctl| {
							ctl.update_selected(NodePatch::data(DataPatch::description(description)))
						});
					}
				/>
				<label>"Type"</label>
				<select
					prop:value=selected_text(status, |n| n.kind.key().to_string())
					on:change=move |ev| {
						if let Some(kind) = NodeKind::from_key(&event_target_value(&ev)) {
							editor_kind.apply(|ctl| ctl.update_selected(NodePatch::kind(kind)));
						}
					}
				>
					{kind_options}
				</select>
				<pre class="metadata">
					{selected_text(status, |n| {
						if n.data.metadata.is_empty() {
							String::new()
						} else {
							serde_json::to_string_pretty(&n.data.metadata).unwrap_or_default()
						}
					})}
				</pre>
				<button
					class="danger"
					on:click=editor.on_click(|ctl| {
						ctl.delete_selected();
					})
				>
					"Delete Node"
				</button>
			</div>

			<div class="status-bar" style="position: absolute; bottom: 8px; left: 8px;">
				<span>
					{move || {
						let s = status.get();
						format!("Nodes: {} | Connections: {}", s.node_count, s.connection_count)
					}}
				</span>
				<span class="hint">{move || status.get().hint}</span>
			</div>
		</div>
	}
}
