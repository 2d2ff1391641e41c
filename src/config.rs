use crate::core::colormap::ColorMapKind;
use crate::core::interp::InterpMethod;
use crate::core::kernel::KernelKind;
use crate::solver::newton::NewtonOptions;
use crate::surface::table::ColumnSelection;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawConfig {
    #[serde(default = "DrawConfig::default_dimension")]
    pub dimension: String,
    #[serde(default = "DrawConfig::default_shift")]
    pub shift: usize,
    #[serde(default = "DrawConfig::default_z_min")]
    pub z_min: f64,
    #[serde(default = "DrawConfig::default_z_max")]
    pub z_max: f64,
    #[serde(default = "DrawConfig::default_k_min")]
    pub k_min: f64,
    #[serde(default = "DrawConfig::default_k_max")]
    pub k_max: f64,
    /// Contour level step.
    #[serde(default = "DrawConfig::default_smooth")]
    pub smooth: f64,
    #[serde(default = "DrawConfig::default_x_column")]
    pub x_column: usize,
    #[serde(default = "DrawConfig::default_y_column")]
    pub y_column: usize,
    #[serde(default = "DrawConfig::default_z_column")]
    pub z_column: usize,
    #[serde(default)]
    pub interpolation: InterpMethod,
    #[serde(default = "DrawConfig::default_grid_resolution")]
    pub grid_resolution: usize,
    /// `{dim}` is replaced by the dimension.
    #[serde(default = "DrawConfig::default_input_pattern")]
    pub input_pattern: String,
    #[serde(default = "DrawConfig::default_output_pattern")]
    pub output_pattern: String,
}

impl DrawConfig {
    fn default_dimension() -> String {
        "1".to_string()
    }
    fn default_shift() -> usize {
        225
    }
    fn default_z_min() -> f64 {
        0.0
    }
    fn default_z_max() -> f64 {
        8.0
    }
    fn default_k_min() -> f64 {
        -1.0
    }
    fn default_k_max() -> f64 {
        1.0
    }
    fn default_smooth() -> f64 {
        0.1
    }
    fn default_x_column() -> usize {
        2
    }
    fn default_y_column() -> usize {
        3
    }
    fn default_z_column() -> usize {
        4
    }
    fn default_grid_resolution() -> usize {
        200
    }
    fn default_input_pattern() -> String {
        "surface{dim}d.plt".to_string()
    }
    fn default_output_pattern() -> String {
        "plots{dim}d.png".to_string()
    }

    pub fn columns(&self) -> ColumnSelection {
        ColumnSelection {
            x: self.x_column,
            y: self.y_column,
            z: self.z_column,
        }
    }

    pub fn input_for(&self, dimension: &str) -> String {
        self.input_pattern.replace("{dim}", dimension)
    }

    pub fn output_for(&self, dimension: &str) -> String {
        self.output_pattern.replace("{dim}", dimension)
    }
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            dimension: Self::default_dimension(),
            shift: Self::default_shift(),
            z_min: Self::default_z_min(),
            z_max: Self::default_z_max(),
            k_min: Self::default_k_min(),
            k_max: Self::default_k_max(),
            smooth: Self::default_smooth(),
            x_column: Self::default_x_column(),
            y_column: Self::default_y_column(),
            z_column: Self::default_z_column(),
            interpolation: InterpMethod::default(),
            grid_resolution: Self::default_grid_resolution(),
            input_pattern: Self::default_input_pattern(),
            output_pattern: Self::default_output_pattern(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "RenderConfig::default_size")]
    pub width: u32,
    #[serde(default = "RenderConfig::default_size")]
    pub height: u32,
    #[serde(default)]
    pub colormap: ColorMapKind,
    #[serde(default = "RenderConfig::default_over_color")]
    pub over_color: [u8; 3],
    /// Defaults to the lowest colour of the map.
    #[serde(default)]
    pub under_color: Option<[u8; 3]>,
    #[serde(default = "RenderConfig::default_title")]
    pub title: String,
    #[serde(default = "RenderConfig::default_x_desc")]
    pub x_desc: String,
    #[serde(default = "RenderConfig::default_y_desc")]
    pub y_desc: String,
    #[serde(default = "RenderConfig::default_column_label")]
    pub column_label: String,
    #[serde(default = "RenderConfig::default_row_label")]
    pub row_label: String,
    #[serde(default = "RenderConfig::default_axis_ticks")]
    pub x_ticks: usize,
    #[serde(default = "RenderConfig::default_axis_ticks")]
    pub y_ticks: usize,
    #[serde(default = "RenderConfig::default_colorbar_ticks")]
    pub colorbar_ticks: usize,
    #[serde(default = "RenderConfig::default_font_family")]
    pub font_family: String,
    #[serde(default = "RenderConfig::default_title_font_size")]
    pub title_font_size: f64,
    #[serde(default = "RenderConfig::default_label_font_size")]
    pub label_font_size: f64,
    #[serde(default = "RenderConfig::default_tick_font_size")]
    pub tick_font_size: f64,
}

impl RenderConfig {
    fn default_size() -> u32 {
        2000
    }
    fn default_over_color() -> [u8; 3] {
        [255, 0, 0]
    }
    fn default_title() -> String {
        "N(k_m, k_w, σ_m, σ_w) ({dim}D case)".to_string()
    }
    fn default_x_desc() -> String {
        "σ_m".to_string()
    }
    fn default_y_desc() -> String {
        "σ_w".to_string()
    }
    fn default_column_label() -> String {
        "k_m".to_string()
    }
    fn default_row_label() -> String {
        "k_w".to_string()
    }
    fn default_axis_ticks() -> usize {
        5
    }
    fn default_colorbar_ticks() -> usize {
        10
    }
    fn default_font_family() -> String {
        "sans-serif".to_string()
    }
    fn default_title_font_size() -> f64 {
        40.0
    }
    fn default_label_font_size() -> f64 {
        24.0
    }
    fn default_tick_font_size() -> f64 {
        18.0
    }

    pub fn over(&self) -> RGBColor {
        let [r, g, b] = self.over_color;
        RGBColor(r, g, b)
    }

    pub fn under(&self) -> Option<RGBColor> {
        self.under_color.map(|[r, g, b]| RGBColor(r, g, b))
    }

    pub fn title_for(&self, dimension: &str) -> String {
        self.title.replace("{dim}", dimension)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: Self::default_size(),
            height: Self::default_size(),
            colormap: ColorMapKind::default(),
            over_color: Self::default_over_color(),
            under_color: None,
            title: Self::default_title(),
            x_desc: Self::default_x_desc(),
            y_desc: Self::default_y_desc(),
            column_label: Self::default_column_label(),
            row_label: Self::default_row_label(),
            x_ticks: Self::default_axis_ticks(),
            y_ticks: Self::default_axis_ticks(),
            colorbar_ticks: Self::default_colorbar_ticks(),
            font_family: Self::default_font_family(),
            title_font_size: Self::default_title_font_size(),
            label_font_size: Self::default_label_font_size(),
            tick_font_size: Self::default_tick_font_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default)]
    pub kernel: KernelKind,
    /// Quadrature nodes over the kernel support.
    #[serde(default = "SolverConfig::default_space_points")]
    pub space_points: usize,
    #[serde(default = "SolverConfig::default_eps")]
    pub eps: f64,
    #[serde(default = "SolverConfig::default_max_iter")]
    pub max_iter: usize,
    #[serde(default = "SolverConfig::default_max_halvings")]
    pub max_halvings: usize,
}

impl SolverConfig {
    fn default_space_points() -> usize {
        10_001
    }
    fn default_eps() -> f64 {
        NewtonOptions::default().eps
    }
    fn default_max_iter() -> usize {
        NewtonOptions::default().max_iter
    }
    fn default_max_halvings() -> usize {
        NewtonOptions::default().max_halvings
    }

    pub fn newton(&self) -> NewtonOptions {
        NewtonOptions {
            max_iter: self.max_iter,
            eps: self.eps,
            max_halvings: self.max_halvings,
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            kernel: KernelKind::default(),
            space_points: Self::default_space_points(),
            eps: Self::default_eps(),
            max_iter: Self::default_max_iter(),
            max_halvings: Self::default_max_halvings(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub draw: DrawConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub solver: SolverConfig,
}

impl AppConfig {
    /// Reads `path`, falling back to defaults. A missing file is created with
    /// every default written out as a comment.
    pub fn load_or_default(path: &str) -> Self {
        let path_obj = Path::new(path);
        if path_obj.exists() {
            match fs::read_to_string(path_obj) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => return cfg,
                    Err(err) => {
                        warn!("Failed to parse config {path}: {err}. Using defaults.");
                    }
                },
                Err(err) => {
                    warn!("Failed to read config {path}: {err}. Using defaults.");
                }
            }
            return Self::default();
        }

        let default_cfg = Self::default();
        match toml::to_string_pretty(&default_cfg) {
            Ok(text) => {
                if let Err(err) = fs::write(path_obj, Self::commented(&text)) {
                    warn!("Failed to write default config to {path}: {err}");
                }
            }
            Err(err) => {
                warn!("Failed to serialize default config ({err}); continuing with defaults");
            }
        }
        default_cfg
    }

    /// Comments out every key, keeping section headers so the file still
    /// parses to the defaults.
    fn commented(text: &str) -> String {
        let mut out = String::new();
        let mut in_array = false;
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                out.push('\n');
                continue;
            }
            let is_header = !in_array && trimmed.starts_with('[') && trimmed.ends_with(']');
            if is_header {
                out.push_str(line);
            } else {
                // multi-line arrays from to_string_pretty
                if trimmed.ends_with('[') {
                    in_array = true;
                } else if in_array && trimmed.starts_with(']') {
                    in_array = false;
                }
                out.push_str("# ");
                out.push_str(line);
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn unique_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "kurtic_config_test_{}_{}",
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn load_or_default_writes_defaults_cleanly() {
        let path = unique_path("defaults.toml");
        let path_str = path.to_string_lossy().to_string();
        let _ = fs::remove_file(&path);

        let cfg = AppConfig::load_or_default(&path_str);
        assert!(path.exists(), "config file should be created");
        assert_eq!(cfg.draw.shift, 225);
        assert_eq!(cfg.draw.z_max, 8.0);
        assert_eq!(cfg.draw.interpolation, InterpMethod::Cubic);
        assert_eq!(cfg.render.over_color, [255, 0, 0]);
        assert_eq!(cfg.solver.kernel, KernelKind::Kurtic);

        let contents = fs::read_to_string(&path).expect("read written config");
        assert!(contents.contains("[draw]"), "section headers stay live");
        assert!(contents.contains("# shift = 225"), "keys are commented");
        assert!(contents.contains("# smooth = 0.1"));
        assert!(contents.contains("# interpolation = \"cubic\""));

        // the commented file parses back to the defaults
        let reread = AppConfig::load_or_default(&path_str);
        assert_eq!(reread.draw.grid_resolution, 200);
        assert_eq!(reread.render.title, cfg.render.title);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_or_default_reads_existing() {
        let path = unique_path("custom.toml");
        let path_str = path.to_string_lossy().to_string();
        let mut custom = AppConfig::default();
        custom.draw.shift = 400;
        custom.draw.smooth = 0.05;
        custom.draw.interpolation = InterpMethod::Linear;
        custom.render.colormap = ColorMapKind::Viridis;
        custom.render.under_color = Some([0, 0, 255]);
        custom.solver.kernel = KernelKind::Roughgarden;
        custom.solver.eps = 1e-8;
        let text = toml::to_string_pretty(&custom).unwrap();
        fs::write(&path, text).unwrap();

        let cfg = AppConfig::load_or_default(&path_str);
        assert_eq!(cfg.draw.shift, 400);
        assert_eq!(cfg.draw.smooth, 0.05);
        assert_eq!(cfg.draw.interpolation, InterpMethod::Linear);
        assert_eq!(cfg.render.colormap, ColorMapKind::Viridis);
        assert_eq!(cfg.render.under(), Some(RGBColor(0, 0, 255)));
        assert_eq!(cfg.solver.kernel, KernelKind::Roughgarden);
        assert_eq!(cfg.solver.eps, 1e-8);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let path = unique_path("partial.toml");
        let path_str = path.to_string_lossy().to_string();
        fs::write(&path, "[draw]\nshift = 400\n").unwrap();
        let cfg = AppConfig::load_or_default(&path_str);
        assert_eq!(cfg.draw.shift, 400);
        assert_eq!(cfg.draw.z_max, 8.0);
        assert_eq!(cfg.render.width, 2000);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let path = unique_path("broken.toml");
        let path_str = path.to_string_lossy().to_string();
        fs::write(&path, "[draw\nshift = \n").unwrap();
        let cfg = AppConfig::load_or_default(&path_str);
        assert_eq!(cfg.draw.shift, 225);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn patterns_substitute_dimension() {
        let draw = DrawConfig::default();
        assert_eq!(draw.input_for("2"), "surface2d.plt");
        assert_eq!(draw.output_for("3"), "plots3d.png");
        let render = RenderConfig::default();
        assert_eq!(render.title_for("1"), "N(k_m, k_w, σ_m, σ_w) (1D case)");
    }
}
