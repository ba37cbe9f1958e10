//! Grafana dashboard JSON model, limited to what provisioned dashboards use.

use serde::{Deserialize, Serialize};

/// Datasource descriptor as returned by `GET /api/datasources/name/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datasource {
    pub uid: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
}

/// How panels and targets point at a datasource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub uid: String,
}

impl From<&Datasource> for DatasourceRef {
    fn from(ds: &Datasource) -> Self {
        Self {
            kind: ds.kind.clone(),
            uid: ds.uid.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDefinition {
    /// Always `null` so Grafana matches on `uid` instead of a database id.
    pub id: Option<u64>,
    pub uid: String,
    pub title: String,
    pub tags: Vec<String>,
    pub timezone: String,
    pub refresh: String,
    pub schema_version: u32,
    pub time: TimeRange,
    pub panels: Vec<PanelDefinition>,
    /// Panel id the next added panel would receive.
    #[serde(skip)]
    pub next_panel_id: u32,
    #[serde(skip)]
    pub datasource: DatasourceRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelDefinition {
    pub id: u32,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub datasource: DatasourceRef,
    pub targets: Vec<Target>,
    pub field_config: FieldConfig,
    pub options: PanelOptions,
    pub grid_pos: GridPos,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub datasource: DatasourceRef,
    pub editor_mode: String,
    pub expr: String,
    pub instant: bool,
    pub range: bool,
    pub ref_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridPos {
    pub h: u32,
    pub w: u32,
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldConfig {
    pub defaults: FieldDefaults,
    pub overrides: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDefaults {
    pub color: ColorMode,
    pub custom: CustomFieldConfig,
    pub mappings: Vec<serde_json::Value>,
    pub thresholds: Thresholds,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorMode {
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldConfig {
    pub axis_centered_zero: bool,
    pub axis_color_mode: String,
    pub axis_label: String,
    pub axis_placement: String,
    pub bar_alignment: i32,
    pub draw_style: String,
    pub fill_opacity: u32,
    pub gradient_mode: String,
    pub hide_from: HideFrom,
    pub line_interpolation: String,
    pub line_width: u32,
    pub point_size: u32,
    pub scale_distribution: ScaleDistribution,
    pub show_points: String,
    pub span_nulls: bool,
    pub stacking: Stacking,
    pub thresholds_style: ThresholdsStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HideFrom {
    pub legend: bool,
    pub tooltip: bool,
    pub viz: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScaleDistribution {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stacking {
    pub group: String,
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThresholdsStyle {
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thresholds {
    pub mode: String,
    pub steps: Vec<ThresholdStep>,
}

/// One threshold step; the base step has `value: null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdStep {
    pub color: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelOptions {
    pub legend: LegendOptions,
    pub tooltip: TooltipOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendOptions {
    pub calcs: Vec<String>,
    pub display_mode: String,
    pub placement: String,
    pub show_legend: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TooltipOptions {
    pub mode: String,
    pub sort: String,
}

/// Body of `POST /api/dashboards/db`.
#[derive(Debug, Serialize)]
pub struct SaveDashboardRequest<'a> {
    pub dashboard: &'a DashboardDefinition,
    pub overwrite: bool,
    pub message: String,
}

/// Grafana's answer to a dashboard save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub uid: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// `GET /api/health` response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}
