//! Lag overlay.
//!
//! [`render_rows`] turns a metrics snapshot into plain display data (labels,
//! colors, sparkline geometry); [`LagOverlay`] writes that data into a fixed
//! panel in the page.

use std::sync::Arc;

use chesskit_protocols::{DomError, DomPort, NodeId};
use tracing::debug;

use crate::types::{LagMetrics, MetricHealth, MetricName, MetricState};

pub const OVERLAY_ID: &str = "chess-kit-lag-overlay";

pub const SPARK_WIDTH: f64 = 80.0;
pub const SPARK_HEIGHT: f64 = 22.0;
/// Top and bottom padding inside the sparkline box.
pub const SPARK_PADDING: f64 = 2.0;

const NO_VALUE_COLOR: &str = "#6b7280";
const COLLAPSED_ICON: &str = "\u{25B6}";
const EXPANDED_ICON: &str = "\u{25BC}";

/// Polyline data for one metric's history.
#[derive(Debug, Clone, PartialEq)]
pub struct Sparkline {
    /// `x,y` pairs, space separated.
    pub line: String,
    /// `line` closed along the bottom edge.
    pub fill: String,
    pub stroke: &'static str,
    pub fill_color: &'static str,
}

/// Display data for one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRow {
    pub name: MetricName,
    pub label: &'static str,
    /// `N/A`, or the rounded value with its unit.
    pub display: String,
    pub dot_color: &'static str,
    pub value_color: &'static str,
    pub sparkline: Option<Sparkline>,
}

/// Build the sparkline for `state`. Needs at least two history points.
///
/// The y range is anchored on the thresholds so a flat healthy line does not
/// fill the box: the ceiling is 1.3x the good bound (higher-is-better) or
/// 1.5x the degraded bound, raised to fit the history. Better values are
/// drawn towards the top.
pub fn sparkline(name: MetricName, state: &MetricState) -> Option<Sparkline> {
    let history = &state.history;
    if history.len() < 2 {
        return None;
    }

    let thresholds = name.thresholds();
    let max = history.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = history.iter().copied().fold(f64::INFINITY, f64::min);
    let (ceiling, floor) = if thresholds.higher_is_better {
        ((thresholds.good * 1.3).max(max), min.min(0.0))
    } else {
        ((thresholds.degraded * 1.5).max(max), 0.0)
    };
    let range = if ceiling - floor == 0.0 {
        1.0
    } else {
        ceiling - floor
    };

    let step = SPARK_WIDTH / (history.len() - 1) as f64;
    let draw_height = SPARK_HEIGHT - SPARK_PADDING * 2.0;
    let line = history
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let x = i as f64 * step;
            let normalized = (value - floor) / range;
            let ratio = if thresholds.higher_is_better {
                1.0 - normalized
            } else {
                normalized
            };
            let y = SPARK_PADDING + ratio * draw_height;
            format!("{:.1},{:.1}", x, y)
        })
        .collect::<Vec<_>>()
        .join(" ");

    let last_x = (history.len() - 1) as f64 * step;
    let fill = format!(
        "0,{h} {line} {last_x:.1},{h}",
        h = SPARK_HEIGHT,
        line = line,
        last_x = last_x
    );

    Some(Sparkline {
        line,
        fill,
        stroke: state.health.color(),
        fill_color: state.health.spark_fill_color(),
    })
}

pub fn render_row(name: MetricName, state: &MetricState) -> OverlayRow {
    let (display, value_color) = match state.value {
        Some(value) => (
            format!("{}{}", value.round(), name.unit()),
            state.health.value_color(),
        ),
        None => ("N/A".to_string(), NO_VALUE_COLOR),
    };
    OverlayRow {
        name,
        label: name.label(),
        display,
        dot_color: state.health.color(),
        value_color,
        sparkline: sparkline(name, state),
    }
}

/// One row per metric, in display order.
pub fn render_rows(metrics: &LagMetrics) -> Vec<OverlayRow> {
    MetricName::ALL
        .into_iter()
        .map(|name| {
            let state = metrics.get(&name).cloned().unwrap_or_default();
            render_row(name, &state)
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct RowNodes {
    name: MetricName,
    dot: NodeId,
    value: NodeId,
    line: NodeId,
    fill: NodeId,
}

#[derive(Debug)]
struct OverlayNodes {
    container: NodeId,
    body: NodeId,
    collapse_icon: NodeId,
    rows: Vec<RowNodes>,
}

/// The telemetry panel in the bottom-right corner of the page.
pub struct LagOverlay {
    dom: Arc<dyn DomPort>,
    nodes: Option<OverlayNodes>,
    collapsed: bool,
}

fn styled(dom: &dyn DomPort, tag: &str, styles: &[(&str, &str)]) -> NodeId {
    let node = dom.create_element(tag);
    for (property, value) in styles {
        dom.set_style(node, property, value);
    }
    node
}

impl LagOverlay {
    pub fn new(dom: Arc<dyn DomPort>) -> Self {
        Self {
            dom,
            nodes: None,
            collapsed: false,
        }
    }

    /// Build the panel, replacing any existing one.
    pub fn create(&mut self) -> Result<(), DomError> {
        self.remove();
        let dom = &*self.dom;

        let container = styled(
            dom,
            "div",
            &[
                ("position", "fixed"),
                ("bottom", "12px"),
                ("right", "12px"),
                ("z-index", "999998"),
                ("background", "rgba(15, 23, 42, 0.92)"),
                ("border-radius", "8px"),
                ("font-family", "\"Fira Code\", \"Courier New\", monospace"),
                ("font-size", "11px"),
                ("color", "#e2e8f0"),
                ("min-width", "260px"),
            ],
        );
        dom.set_attribute(container, "id", OVERLAY_ID);

        let header = styled(
            dom,
            "div",
            &[
                ("display", "flex"),
                ("justify-content", "space-between"),
                ("padding", "6px 10px"),
                ("cursor", "pointer"),
            ],
        );
        let title = styled(dom, "span", &[("font-weight", "600"), ("color", "#fbbf24")]);
        dom.set_text_content(title, "Lag Telemetry");
        let collapse_icon = styled(dom, "span", &[("font-size", "10px"), ("margin-left", "8px")]);
        dom.set_text_content(collapse_icon, EXPANDED_ICON);
        dom.append_child(header, title)?;
        dom.append_child(header, collapse_icon)?;

        let body = styled(
            dom,
            "div",
            &[
                ("padding", "6px 10px 8px"),
                ("display", "flex"),
                ("flex-direction", "column"),
                ("gap", "5px"),
            ],
        );

        let mut rows = Vec::with_capacity(MetricName::ALL.len());
        for name in MetricName::ALL {
            let row = styled(dom, "div", &[("display", "flex"), ("gap", "6px")]);
            dom.set_attribute(row, "data-metric", name.as_str());

            let dot = styled(
                dom,
                "span",
                &[
                    ("width", "7px"),
                    ("height", "7px"),
                    ("border-radius", "50%"),
                    ("background", MetricHealth::Unknown.color()),
                ],
            );
            let label = styled(dom, "span", &[("width", "52px")]);
            dom.set_text_content(label, name.label());

            let svg = dom.create_element("svg");
            let width = SPARK_WIDTH.to_string();
            let height = SPARK_HEIGHT.to_string();
            dom.set_attribute(svg, "width", &width);
            dom.set_attribute(svg, "height", &height);
            dom.set_attribute(svg, "viewBox", &format!("0 0 {} {}", width, height));
            let fill = dom.create_element("polyline");
            dom.set_attribute(fill, "fill", MetricHealth::Unknown.spark_fill_color());
            dom.set_attribute(fill, "stroke", "none");
            dom.set_attribute(fill, "points", "");
            let line = dom.create_element("polyline");
            dom.set_attribute(line, "fill", "none");
            dom.set_attribute(line, "stroke", MetricHealth::Unknown.color());
            dom.set_attribute(line, "stroke-width", "1.5");
            dom.set_attribute(line, "points", "");
            dom.append_child(svg, fill)?;
            dom.append_child(svg, line)?;

            let value = styled(dom, "span", &[("min-width", "48px"), ("color", NO_VALUE_COLOR)]);
            dom.set_text_content(value, "N/A");

            for child in [dot, label, svg, value] {
                dom.append_child(row, child)?;
            }
            dom.append_child(body, row)?;
            rows.push(RowNodes {
                name,
                dot,
                value,
                line,
                fill,
            });
        }

        dom.append_child(container, header)?;
        dom.append_child(container, body)?;
        dom.append_child(dom.body(), container)?;

        self.nodes = Some(OverlayNodes {
            container,
            body,
            collapse_icon,
            rows,
        });
        debug!("Lag overlay created");
        Ok(())
    }

    /// Write a metrics snapshot into the panel. No-op when not created.
    pub fn update(&self, metrics: &LagMetrics) {
        let Some(nodes) = &self.nodes else {
            return;
        };
        let dom = &*self.dom;
        for row in &nodes.rows {
            let state = metrics.get(&row.name).cloned().unwrap_or_default();
            let rendered = render_row(row.name, &state);

            dom.set_style(row.dot, "background", rendered.dot_color);
            dom.set_text_content(row.value, &rendered.display);
            dom.set_style(row.value, "color", rendered.value_color);

            match &rendered.sparkline {
                Some(spark) => {
                    dom.set_attribute(row.line, "points", &spark.line);
                    dom.set_attribute(row.line, "stroke", spark.stroke);
                    dom.set_attribute(row.fill, "points", &spark.fill);
                    dom.set_attribute(row.fill, "fill", spark.fill_color);
                }
                None => {
                    dom.set_attribute(row.line, "points", "");
                    dom.set_attribute(row.fill, "points", "");
                }
            }
        }
    }

    /// Header click. Returns the new collapsed state.
    pub fn toggle_collapse(&mut self) -> bool {
        self.collapsed = !self.collapsed;
        if let Some(nodes) = &self.nodes {
            let (display, icon) = if self.collapsed {
                ("none", COLLAPSED_ICON)
            } else {
                ("flex", EXPANDED_ICON)
            };
            self.dom.set_style(nodes.body, "display", display);
            self.dom.set_text_content(nodes.collapse_icon, icon);
        }
        self.collapsed
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn is_present(&self) -> bool {
        self.nodes
            .as_ref()
            .is_some_and(|nodes| self.dom.is_connected(nodes.container))
    }

    /// Remove the panel (and any stray copy). Safe to call repeatedly.
    pub fn remove(&mut self) {
        for node in self.dom.query_all(&format!("#{}", OVERLAY_ID)) {
            self.dom.remove(node);
        }
        self.nodes = None;
        self.collapsed = false;
    }
}

#[cfg(test)]
#[path = "overlay_tests.rs"]
mod tests;
