use crate::grafana_models::{
    ColorMode, CustomFieldConfig, DashboardDefinition, Datasource, DatasourceRef, FieldConfig,
    FieldDefaults, GridPos, HideFrom, LegendOptions, PanelDefinition, PanelOptions,
    ScaleDistribution, Stacking, Target, ThresholdStep, Thresholds, ThresholdsStyle, TimeRange,
    TooltipOptions,
};

/// Id given to the first panel of every dashboard.
pub const FIRST_PANEL_ID: u32 = 1;

const DASHBOARD_SCHEMA_VERSION: u32 = 38;
const DASHBOARD_UID_PREFIX: &str = "docker-";
const DASHBOARD_UID_ID_CHARS: usize = 12;

/// A per-container metric that gets its own panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedMetric {
    /// Suffix for the panel title, e.g. `CPU`.
    pub label: &'static str,
    /// Prometheus metric name, labelled with the container id as `id`.
    pub metric: &'static str,
}

pub const CPU: TrackedMetric = TrackedMetric {
    label: "CPU",
    metric: "cpu_usage_percent",
};

/// Metrics a provisioned dashboard charts, in panel order.
pub const TRACKED_METRICS: &[TrackedMetric] = &[CPU];

impl TrackedMetric {
    pub fn query(&self, container_id: &str) -> String {
        format!("rate({}{{id=\"{}\"}}[$__interval])", self.metric, container_id)
    }
}

/// Visual settings shared by every provisioned panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelDefaults {
    pub thresholds: Vec<ThresholdStep>,
    pub legend: LegendOptions,
    pub tooltip: TooltipOptions,
    pub color_mode: String,
    pub draw_style: String,
    pub line_interpolation: String,
    pub line_width: u32,
    pub fill_opacity: u32,
    pub point_size: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for PanelDefaults {
    fn default() -> Self {
        Self {
            thresholds: vec![
                ThresholdStep {
                    color: "green".to_string(),
                    value: None,
                },
                ThresholdStep {
                    color: "red".to_string(),
                    value: Some(80.0),
                },
            ],
            legend: LegendOptions {
                calcs: Vec::new(),
                display_mode: "list".to_string(),
                placement: "bottom".to_string(),
                show_legend: true,
            },
            tooltip: TooltipOptions {
                mode: "single".to_string(),
                sort: "none".to_string(),
            },
            color_mode: "palette-classic".to_string(),
            draw_style: "line".to_string(),
            line_interpolation: "linear".to_string(),
            line_width: 1,
            fill_opacity: 0,
            point_size: 5,
            width: 12,
            height: 8,
        }
    }
}

/// Stable dashboard uid for a container, so re-provisioning overwrites and
/// removal can find it.
pub fn dashboard_uid(container_id: &str) -> String {
    let short: String = container_id.chars().take(DASHBOARD_UID_ID_CHARS).collect();
    format!("{DASHBOARD_UID_PREFIX}{short}")
}

/// Synthesizes dashboards and panels. Pure: the same input always yields
/// the same definition.
#[derive(Debug, Clone, Default)]
pub struct DashboardBuilder {
    defaults: PanelDefaults,
}

impl DashboardBuilder {
    pub fn new(defaults: PanelDefaults) -> Self {
        Self { defaults }
    }

    /// Panel charting `metric` for one container. `slot` is the panel's
    /// index on the dashboard and decides its grid position.
    pub fn build_panel(
        &self,
        container_name: &str,
        container_id: &str,
        panel_id: u32,
        slot: u32,
        metric: &TrackedMetric,
        datasource: &Datasource,
    ) -> PanelDefinition {
        let datasource = DatasourceRef::from(datasource);
        let d = &self.defaults;

        PanelDefinition {
            id: panel_id,
            title: format!("{} {}", container_name, metric.label),
            kind: "timeseries".to_string(),
            datasource: datasource.clone(),
            targets: vec![Target {
                datasource,
                editor_mode: "builder".to_string(),
                expr: metric.query(container_id),
                instant: false,
                range: true,
                ref_id: "A".to_string(),
            }],
            field_config: FieldConfig {
                defaults: FieldDefaults {
                    color: ColorMode {
                        mode: d.color_mode.clone(),
                    },
                    custom: CustomFieldConfig {
                        axis_centered_zero: false,
                        axis_color_mode: "text".to_string(),
                        axis_label: String::new(),
                        axis_placement: "auto".to_string(),
                        bar_alignment: 0,
                        draw_style: d.draw_style.clone(),
                        fill_opacity: d.fill_opacity,
                        gradient_mode: "none".to_string(),
                        hide_from: HideFrom {
                            legend: false,
                            tooltip: false,
                            viz: false,
                        },
                        line_interpolation: d.line_interpolation.clone(),
                        line_width: d.line_width,
                        point_size: d.point_size,
                        scale_distribution: ScaleDistribution {
                            kind: "linear".to_string(),
                        },
                        show_points: "auto".to_string(),
                        span_nulls: false,
                        stacking: Stacking {
                            group: "A".to_string(),
                            mode: "none".to_string(),
                        },
                        thresholds_style: ThresholdsStyle {
                            mode: "off".to_string(),
                        },
                    },
                    mappings: Vec::new(),
                    thresholds: Thresholds {
                        mode: "absolute".to_string(),
                        steps: d.thresholds.clone(),
                    },
                },
                overrides: Vec::new(),
            },
            options: PanelOptions {
                legend: d.legend.clone(),
                tooltip: d.tooltip.clone(),
            },
            grid_pos: self.grid_pos(slot),
        }
    }

    // Two panels per row.
    fn grid_pos(&self, slot: u32) -> GridPos {
        let d = &self.defaults;
        GridPos {
            h: d.height,
            w: d.width,
            x: (slot % 2) * d.width,
            y: (slot / 2) * d.height,
        }
    }

    /// Dashboard for one container with a panel per tracked metric.
    pub fn build_dashboard(
        &self,
        container_id: &str,
        container_name: &str,
        datasource: &Datasource,
    ) -> DashboardDefinition {
        let mut next_panel_id = FIRST_PANEL_ID;
        let mut panels = Vec::with_capacity(TRACKED_METRICS.len());
        for (slot, metric) in (0u32..).zip(TRACKED_METRICS) {
            panels.push(self.build_panel(
                container_name,
                container_id,
                next_panel_id,
                slot,
                metric,
                datasource,
            ));
            next_panel_id += 1;
        }

        DashboardDefinition {
            id: None,
            uid: dashboard_uid(container_id),
            title: format!("{} CPU", container_name),
            tags: vec!["docker".to_string(), "dockboard".to_string()],
            timezone: "browser".to_string(),
            refresh: "5s".to_string(),
            schema_version: DASHBOARD_SCHEMA_VERSION,
            time: TimeRange {
                from: "now-15m".to_string(),
                to: "now".to_string(),
            },
            panels,
            next_panel_id,
            datasource: DatasourceRef::from(datasource),
        }
    }
}
