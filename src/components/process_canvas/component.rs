use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::debug;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window,
};

use super::config::CanvasConfig;
use super::dialogs::EdgeEditor;
use super::interaction::Gesture;
use super::render;
use super::session::SaveFn;
use super::state::{CanvasState, NoticeLevel, SessionScope};
use super::types::{Dimension, EdgeType, Graph, Marker, Point};

const NOTICE_TTL: Duration = Duration::from_secs(4);

type Shared = StoredValue<Option<CanvasState>, LocalStorage>;

fn update_state<T>(state: Shared, f: impl FnOnce(&mut CanvasState) -> T) -> Option<T> {
	state.try_update_value(|s| s.as_mut().map(f)).flatten()
}

fn read_state<T>(state: Shared, f: impl FnOnce(&CanvasState) -> T) -> Option<T> {
	state.try_with_value(|s| s.as_ref().map(f)).flatten()
}

fn edit(state: Shared, f: impl FnOnce(&mut EdgeEditor)) {
	update_state(state, |s| {
		if let Some(editor) = s.edge_editor_mut() {
			f(editor);
		}
	});
}

/// Process-network editor. Owns its graph after mount; `graph` is read once.
#[component]
pub fn ProcessCanvas(
	#[prop(into)] graph: Signal<Graph>,
	on_save: SaveFn,
	#[prop(default = false)] read_only: bool,
	#[prop(optional)] on_unsaved_changes: Option<Callback<bool>>,
	#[prop(optional)] config: Option<CanvasConfig>,
	#[prop(optional)] session: Option<SessionScope>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<html::Canvas>::new();
	let text_ref = NodeRef::<html::Textarea>::new();
	let state: Shared = StoredValue::new_local(None);
	let on_save = StoredValue::new_local(on_save);
	let (revision, set_revision) = signal(0u64);
	let bump = move || set_revision.update(|r| *r += 1);
	let config = config.unwrap_or_default().validated();
	let show_tags = config.show_tags;
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if read_state(state, |_| ()).is_some() {
			return;
		}
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

		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")
			.unwrap()
			.unwrap()
			.dyn_into()
			.unwrap();

		let mut s = CanvasState::new(graph.get_untracked(), config.clone(), read_only);
		s.resize(w, h);
		s.scope = session.clone();
		if let Some(callback) = on_unsaved_changes {
			s.on_unsaved_changes(move |dirty| callback.run(dirty));
		}
		state.set_value(Some(s));
		bump();

		if fullscreen {
			let canvas_resize = canvas.clone();
			*resize_cb.borrow_mut() = Some(Closure::new(move || {
				let win: Window = web_sys::window().unwrap();
				let (nw, nh) = (
					win.inner_width().unwrap().as_f64().unwrap(),
					win.inner_height().unwrap().as_f64().unwrap(),
				);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				update_state(state, |s| s.resize(nw, nh));
			}));
			if let Some(ref cb) = *resize_cb.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (animate_inner, canvas_anim) = (animate.clone(), canvas.clone());
		*animate.borrow_mut() = Some(Closure::new(move || {
			read_state(state, |s| {
				render::render(s, &ctx);
				let _ = web_sys::HtmlElement::style(&canvas_anim).set_property("cursor", s.cursor());
			});
			if let Some(ref cb) = *animate_inner.borrow() {
				let _ = web_sys::window()
					.unwrap()
					.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	// Dismiss each notice a few seconds after it first shows.
	let last_notice = StoredValue::new(0u64);
	Effect::new(move |_| {
		revision.get();
		let Some(id) = read_state(state, |s| s.notice.as_ref().map(|n| n.id)).flatten() else {
			return;
		};
		if id == last_notice.get_value() {
			return;
		}
		last_notice.set_value(id);
		set_timeout(
			move || {
				update_state(state, |s| s.dismiss_notice(Some(id)));
				bump();
			},
			NOTICE_TTL,
		);
	});

	let focus_text = move || {
		request_animation_frame(move || {
			if let Some(field) = text_ref.get_untracked() {
				let _ = field.focus();
				field.select();
			}
		});
	};

	let position = move |ev: &MouseEvent| -> Option<(f64, f64)> {
		let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?;
		let rect = canvas.get_bounding_client_rect();
		Some((
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		))
	};

	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		if let Some(canvas) = canvas_ref.get_untracked() {
			let _ = canvas.focus();
		}
		let Some((x, y)) = position(&ev) else {
			return;
		};
		update_state(state, |s| s.pointer_down(x, y));
		bump();
	};

	let on_mousemove = move |ev: MouseEvent| {
		if let Some((x, y)) = position(&ev) {
			update_state(state, |s| s.pointer_move(x, y));
		}
	};

	let on_mouseup = move |_: MouseEvent| {
		update_state(state, |s| s.pointer_up());
		bump();
	};

	let on_mouseleave = move |_: MouseEvent| {
		update_state(state, |s| s.pointer_leave());
		bump();
	};

	let on_dblclick = move |ev: MouseEvent| {
		let Some((x, y)) = position(&ev) else {
			return;
		};
		update_state(state, |s| s.double_click(x, y));
		bump();
		focus_text();
	};

	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some((x, y)) = position(&ev) {
			update_state(state, |s| s.wheel(x, y, ev.delta_y()));
		}
	};

	let on_keydown = move |ev: KeyboardEvent| {
		let ctrl = ev.ctrl_key() || ev.meta_key();
		let handled = update_state(state, |s| s.key_down(&ev.key(), ctrl, ev.shift_key())).unwrap_or(false);
		if handled {
			ev.prevent_default();
			bump();
		}
	};

	let on_save_click = move |_| {
		let Some(snapshot) = update_state(state, |s| s.begin_save()).flatten() else {
			bump();
			return;
		};
		bump();
		let Some(handler) = on_save.try_get_value() else {
			return;
		};
		spawn_local(async move {
			let outcome = handler(snapshot.clone()).await;
			update_state(state, |s| {
				let _ = s.finish_save(snapshot, outcome);
			});
			bump();
		});
	};

	let text_editor = move || {
		revision.get();
		read_state(state, |s| {
			let Gesture::EditingNodeText(editor) = &s.gesture else {
				return None;
			};
			let node = s.graph().node(editor.node_id)?;
			let at = s.viewport.logical_to_screen(Point::new(node.rect.x, node.rect.y));
			let scale = s.viewport.scale;
			Some((
				editor.buffer.clone(),
				at,
				node.rect.width * scale,
				node.rect.height * scale,
			))
		})
		.flatten()
		.map(|(text, at, w, h)| {
			view! {
				<textarea
					node_ref=text_ref
					class="process-canvas-text"
					style=format!(
						"position: absolute; left: {}px; top: {}px; width: {}px; height: {}px; box-sizing: border-box; resize: none; text-align: center;",
						at.x,
						at.y,
						w,
						h,
					)
					prop:value=text
					on:input=move |ev| {
						let value = event_target_value(&ev);
						update_state(state, |s| s.set_text_buffer(value));
					}
					on:keydown=move |ev: KeyboardEvent| {
						let handled = update_state(state, |s| s.text_key(&ev.key(), ev.shift_key()))
							.unwrap_or(false);
						if handled {
							ev.prevent_default();
							bump();
							focus_text();
						}
					}
				/>
			}
		})
	};

	let edge_panel = move || {
		revision.get();
		read_state(state, |s| s.edge_editor.clone()).flatten().map(|editor| {
			let draft = editor.draft;
			let max = editor.max_strength();
			view! {
				<div class="process-canvas-edge-editor">
					<h3>"Connection"</h3>
					<label>
						"Type "
						<select on:change=move |ev| {
							if let Some(t) = EdgeType::parse(&event_target_value(&ev)) {
								edit(state, |ed| ed.set_type(t));
								bump();
							}
						}>
							{EdgeType::ALL
								.into_iter()
								.map(|t| {
									view! {
										<option value=t.as_str() selected={t == draft.edge_type}>
											{t.as_str()}
										</option>
									}
								})
								.collect_view()}
						</select>
					</label>
					<label>
						{format!("Strength {}", draft.strength)}
						<input
							type="range"
							min="0"
							max=max.to_string()
							prop:value=draft.strength.to_string()
							on:change=move |ev| {
								if let Ok(v) = event_target_value(&ev).parse::<u8>() {
									edit(state, |ed| ed.set_strength(v));
									bump();
								}
							}
						/>
					</label>
					<MarkerPicker
						label="Start"
						value=draft.start_marker
						on_pick=move |m| {
							edit(state, |ed| ed.set_start_marker(m));
							bump();
						}
					/>
					<MarkerPicker
						label="End"
						value=draft.end_marker
						on_pick=move |m| {
							edit(state, |ed| ed.set_end_marker(m));
							bump();
						}
					/>
					<label>
						<input
							type="checkbox"
							prop:checked=draft.ambivalent
							on:change=move |ev| {
								let on = event_target_checked(&ev);
								edit(state, |ed| ed.set_ambivalent(on));
								bump();
							}
						/>
						" Ambivalent"
					</label>
					<div class="actions">
						<button on:click=move |_| {
							update_state(state, |s| {
								let result = s.save_edge_editor();
								s.report(result);
							});
							bump();
						}>"Save"</button>
						<button on:click=move |_| {
							update_state(state, |s| {
								let result = s.delete_edge_editor();
								s.report(result);
							});
							bump();
						}>"Delete"</button>
						<button on:click=move |_| {
							update_state(state, |s| s.cancel_edge_editor());
							bump();
						}>"Cancel"</button>
					</div>
				</div>
			}
		})
	};

	let notice = move || {
		revision.get();
		read_state(state, |s| s.notice.clone()).flatten().map(|n| {
			let class = match n.level {
				NoticeLevel::Info => "process-canvas-notice info",
				NoticeLevel::Error => "process-canvas-notice error",
			};
			let id = n.id;
			view! {
				<div class=class role="status">
					<span>{n.message}</span>
					<button on:click=move |_| {
						update_state(state, |s| s.dismiss_notice(Some(id)));
						bump();
					}>"×"</button>
				</div>
			}
		})
	};

	let connecting = move || {
		revision.get();
		read_state(state, |s| matches!(s.gesture, Gesture::Connecting { .. })).unwrap_or(false)
	};

	let editing_tools = (!read_only).then(|| {
		view! {
			<button on:click=move |_| {
				update_state(state, |s| {
					let result = s.add_node_here();
					s.report(result);
				});
				bump();
				focus_text();
			}>"Add process"</button>
			<select
				title="Type of new connections"
				on:change=move |ev| {
					if let Some(t) = EdgeType::parse(&event_target_value(&ev)) {
						update_state(state, |s| s.connect_type = t);
					}
				}
			>
				{EdgeType::ALL
					.into_iter()
					.map(|t| view! { <option value=t.as_str()>{t.as_str()}</option> })
					.collect_view()}
			</select>
			{show_tags
				.then(|| {
					view! {
						<select
							title="Dimension of new processes"
							on:change=move |ev| {
								let value = event_target_value(&ev);
								let dimension = Dimension::ALL
									.into_iter()
									.find(|d| d.label() == value);
								update_state(state, |s| s.next_dimension = dimension);
							}
						>
							<option value="">"No dimension"</option>
							{Dimension::ALL
								.into_iter()
								.map(|d| view! { <option value=d.label()>{d.label()}</option> })
								.collect_view()}
						</select>
					}
				})}
			<button
				disabled=move || {
					revision.get();
					!read_state(state, |s| s.can_undo()).unwrap_or(false)
				}
				on:click=move |_| {
					update_state(state, |s| s.undo());
					bump();
				}
			>
				"Undo"
			</button>
			<button
				disabled=move || {
					revision.get();
					!read_state(state, |s| s.can_redo()).unwrap_or(false)
				}
				on:click=move |_| {
					update_state(state, |s| s.redo());
					bump();
				}
			>
				"Redo"
			</button>
			<button
				disabled=move || {
					revision.get();
					!read_state(state, |s| s.has_selection()).unwrap_or(false)
				}
				on:click=move |_| {
					update_state(state, |s| {
						let result = s.delete_selected();
						s.report(result);
					});
					bump();
				}
			>
				"Delete"
			</button>
			<button
				style:display=move || { if connecting() { "inline-block" } else { "none" } }
				on:click=move |_| {
					update_state(state, |s| s.cancel_connect());
					bump();
				}
			>
				"Cancel connection"
			</button>
		}
	});

	let save_button = (!read_only).then(|| {
		view! {
			<button
				class="process-canvas-save"
				disabled=move || {
					revision.get();
					read_state(state, |s| s.is_saving()).unwrap_or(true)
				}
				on:click=on_save_click
			>
				{move || {
					revision.get();
					match read_state(state, |s| (s.is_saving(), s.is_dirty())) {
						Some((true, _)) => "Saving…",
						Some((false, true)) => "Save changes",
						_ => "Saved",
					}
				}}
			</button>
		}
	});

	debug!("process canvas mounted (read_only = {read_only})");

	view! {
		<div class="process-canvas" style="position: relative; width: 100%; height: 100%;">
			<div class="process-canvas-toolbar">
				{editing_tools}
				<button on:click=move |_| {
					update_state(state, |s| s.viewport.zoom_in());
				}>"+"</button>
				<button on:click=move |_| {
					update_state(state, |s| s.viewport.zoom_out());
				}>"−"</button>
				<button on:click=move |_| {
					update_state(state, |s| s.viewport.reset());
				}>"Reset view"</button>
				{save_button}
			</div>
			<canvas
				node_ref=canvas_ref
				class="process-canvas-surface"
				tabindex="0"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:dblclick=on_dblclick
				on:wheel=on_wheel
				on:keydown=on_keydown
				style="display: block; outline: none;"
			/>
			{text_editor}
			{edge_panel}
			{notice}
		</div>
	}
}

#[component]
fn MarkerPicker(
	label: &'static str,
	value: Marker,
	on_pick: impl Fn(Marker) + Send + Sync + 'static,
) -> impl IntoView {
	view! {
		<label>
			{format!("{label} marker ")}
			<select on:change=move |ev| {
				if let Some(m) = Marker::parse(&event_target_value(&ev)) {
					on_pick(m);
				}
			}>
				{Marker::ALL
					.into_iter()
					.map(|m| {
						view! {
							<option value=m.as_str() selected={m == value}>
								{m.as_str()}
							</option>
						}
					})
					.collect_view()}
			</select>
		</label>
	}
}
