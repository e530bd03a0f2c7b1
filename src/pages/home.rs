use leptos::prelude::*;
use log::{error, info};

use crate::components::lineage_graph::{
	ChildDescriptor, EdgeDescriptor, ExplorerConfig, InitialEdge, InitialNode, LineageData,
	LineageGraphCanvas,
};

/// Id of the `<script type="application/json">` element a host page can use
/// to embed its own lineage.
const LINEAGE_ELEMENT_ID: &str = "lineage-data";

const MODEL: &str = "UserAnalyticsModel";
const FUNCTIONS: &[(&str, &str)] = &[
	("get_financials", "financial_data"),
	("get_customers", "customer_data"),
	("get_reports", "report_data"),
];
const DATAPOINTS: &[&str] = &[
	"revenue",
	"expenses",
	"customer_count",
	"churn_rate",
	"lifetime_value",
	"order_volume",
	"refund_total",
	"active_users",
	"session_length",
	"conversion_rate",
];
const TABLES: &[&str] = &[
	"FINANCE.PUBLIC.REVENUE_VW",
	"FINANCE.PUBLIC.EXPENSES_VW",
	"CUSTOMER.CORE.CUSTOMER_MASTER_VW",
	"SALES.CORE.ORDERS",
];
const METHODS: &[&str] = &["QRP", "AVG", "SUM", "API"];

fn pick<'a>(items: &[&'a str], seed: usize) -> &'a str {
	items[seed % items.len()]
}

fn title_case(name: &str) -> String {
	name.split('_')
		.filter(|w| !w.is_empty())
		.map(|w| {
			let mut chars = w.chars();
			match chars.next() {
				Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
				None => String::new(),
			}
		})
		.collect::<Vec<String>>()
		.join(" ")
}

fn table_label(table: &str) -> String {
	let short = table.rsplit('.').next().unwrap_or(table);
	title_case(&short.replace("_VW", ""))
}

fn child(id: &str, label: String, node_type: &str, auto_expand: bool) -> ChildDescriptor {
	ChildDescriptor {
		id: id.to_string(),
		label,
		node_type: node_type.to_string(),
		auto_expand,
	}
}

fn edge(edge_type: &str, method: Option<&str>) -> EdgeDescriptor {
	EdgeDescriptor {
		edge_type: edge_type.to_string(),
		method: method.map(str::to_string),
		..Default::default()
	}
}

/// A model with a few functions, one dataset each, datapoints under the
/// datasets and warehouse tables under the datapoints. Tables are shared
/// between datapoints and auto-expand into their columns.
fn sample_lineage() -> LineageData {
	let mut data = LineageData::default();
	data.nodes.push(InitialNode {
		id: MODEL.into(),
		label: MODEL.into(),
		node_type: "model".into(),
	});

	for (f, (function, dataset)) in FUNCTIONS.iter().enumerate() {
		data.nodes.push(InitialNode {
			id: function.to_string(),
			label: function.to_string(),
			node_type: "function".into(),
		});
		data.edges.push(InitialEdge {
			from: MODEL.into(),
			to: function.to_string(),
		});
		data.edge_index
			.insert(MODEL, *function, edge("model_to_function", None));

		// function-scoped dataset ids keep datasets from being shared
		let dataset_id = format!("{}_{}", function, dataset);
		let count = if f == 0 { DATAPOINTS.len() } else { 3 + f };
		data.hidden_children.insert(
			function.to_string(),
			vec![child(
				&dataset_id,
				format!("{} ({} fields)", dataset, count),
				"dataset",
				false,
			)],
		);
		data.edge_index
			.insert(*function, dataset_id.as_str(), edge("function_to_dataset", None));

		let mut datapoints = Vec::new();
		for (d, datapoint) in DATAPOINTS.iter().take(count).enumerate() {
			let seed = f + d;
			let datapoint_id = format!("{}__{}", datapoint, function);
			datapoints.push(child(&datapoint_id, title_case(datapoint), "datapoint", false));
			data.edge_index.insert(
				dataset_id.as_str(),
				datapoint_id.as_str(),
				edge("dataset_to_datapoint", None),
			);

			let table = pick(TABLES, seed);
			data.hidden_children.insert(
				datapoint_id.clone(),
				vec![child(table, table_label(table), "table", true)],
			);
			data.edge_index.insert(
				datapoint_id.as_str(),
				table,
				edge("datapoint_to_table", Some(pick(METHODS, seed * 3 + f))),
			);
		}
		data.hidden_children.insert(dataset_id, datapoints);
	}

	for table in TABLES {
		let columns = ["ID", "AMOUNT", "UPDATED_AT"]
			.iter()
			.map(|column| {
				let column_id = format!("{}.{}", table, column);
				data.edge_index
					.insert(*table, column_id.as_str(), edge("table_to_column", None));
				child(&column_id, title_case(column), "column", false)
			})
			.collect();
		data.hidden_children.insert(table.to_string(), columns);
	}

	data
}

fn lineage_from_page() -> Option<LineageData> {
	let json = web_sys::window()?
		.document()?
		.get_element_by_id(LINEAGE_ELEMENT_ID)?
		.text_content()?;
	match LineageData::from_json(&json) {
		Ok(data) => Some(data),
		Err(err) => {
			error!("Ignoring embedded lineage: {}", err);
			None
		}
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let lineage = lineage_from_page().unwrap_or_else(|| {
		info!("No embedded lineage found, using the sample model");
		sample_lineage()
	});
	let graph_data = Signal::derive(move || lineage.clone());

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
				<LineageGraphCanvas data=graph_data config=ExplorerConfig::default() fullscreen=true />
				<div class="graph-overlay">
					<h1>"Data Lineage"</h1>
					<p class="subtitle">
						"Click a node to expand its children, click it again to collapse. Drag nodes to reposition. Scroll to zoom."
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sample_lineage_is_consistent() {
		let data = sample_lineage();
		assert!(data.validate().is_ok());
		// every hidden parent other than the functions must be reachable as a child
		for parent in data.hidden_children.keys() {
			let is_function = FUNCTIONS.iter().any(|(f, _)| f == parent);
			let is_child = data
				.hidden_children
				.values()
				.flatten()
				.any(|c| &c.id == parent);
			assert!(is_function || is_child, "{} is unreachable", parent);
		}
	}

	#[test]
	fn labels_are_title_cased() {
		assert_eq!(title_case("customer_count"), "Customer Count");
		assert_eq!(table_label("CUSTOMER.CORE.CUSTOMER_MASTER_VW"), "Customer Master");
		assert_eq!(table_label("ORDERS"), "Orders");
	}
}
