use leptos::prelude::*;

use crate::components::force_graph::{ForceGraphCanvas, ForceGraphConfig, GraphDocument};

/// Call graph shipped with the app (networkx node-link format).
const CALL_GRAPH: &str = include_str!("../../assets/graph.json");

#[component]
fn GraphPage(config: ForceGraphConfig, subtitle: &'static str) -> impl IntoView {
	let document = GraphDocument::from_json(CALL_GRAPH);

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
			{document
				.map(|doc| {
					let graph_data = Signal::derive(move || doc.clone());
					view! {
						<div class="fullscreen-graph">
							<ForceGraphCanvas data=graph_data config=config fullscreen=true />
							<div class="graph-overlay">
								<h1>"Service Call Graph"</h1>
								<p class="subtitle">{subtitle}</p>
							</div>
						</div>
					}
				})}
		</ErrorBoundary>
	}
}

/// Metric view: marker size follows average duration, colour the failure ratio.
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<GraphPage
			config=ForceGraphConfig::call_graph()
			subtitle="Size is average duration, colour is failure rate. Drag nodes, click labels for details."
		/>
	}
}

/// Topology-only view with long links and uniform markers.
#[component]
pub fn Overview() -> impl IntoView {
	view! {
		<GraphPage
			config=ForceGraphConfig::overview()
			subtitle="Topology only. Drag nodes, click labels for details."
		/>
	}
}
