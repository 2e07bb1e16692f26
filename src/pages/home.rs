use std::rc::Rc;

use futures::FutureExt;
use leptos::prelude::*;
use log::{info, warn};

use crate::components::process_canvas::{
	CanvasConfig, Graph, ProcessCanvas, SaveError, SaveFn, SessionScope,
};

const DEMO_NETWORK: &str = include_str!("demo_network.json");

/// Load the bundled demo network. Falls back to an empty canvas on bad data.
fn demo_network() -> Graph {
	serde_json::from_str(DEMO_NETWORK).unwrap_or_else(|err| {
		warn!("demo network failed to parse: {err}");
		Graph::default()
	})
}

/// Stand-in for a backend: logs the payload and accepts it.
fn demo_store() -> SaveFn {
	Rc::new(|graph: Graph| {
		async move {
			let payload =
				serde_json::to_string(&graph).map_err(|err| SaveError::Failed(err.to_string()))?;
			info!("saving network ({} bytes)", payload.len());
			Ok::<_, SaveError>(true)
		}
		.boxed_local()
	})
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let graph = Signal::derive(demo_network);
	let (unsaved, set_unsaved) = signal(false);
	let on_unsaved_changes = Callback::new(move |dirty: bool| set_unsaved.set(dirty));
	let session = SessionScope {
		id: "s2".to_string(),
		name: Some("Session 2".to_string()),
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<ProcessCanvas
					graph=graph
					on_save=demo_store()
					on_unsaved_changes=on_unsaved_changes
					config=CanvasConfig::default()
					session=session
					fullscreen=true
				/>
				<div class="graph-overlay">
					<h1>"Process Network"</h1>
					<p class="subtitle">
						"Double-click to edit a process. Drag the corner to resize. Drag the round handle onto another process, or click it and then the other process, to connect them. Click a connection to edit it."
					</p>
					<Show when=move || unsaved.get()>
						<p class="unsaved">"Unsaved changes"</p>
					</Show>
				</div>
			</div>
		</ErrorBoundary>
	}
}
