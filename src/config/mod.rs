use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    CONTROL_POINT_RADIUS, CREATION_SUPPRESSION_MS, DEFAULT_LINE_COLOR, DEFAULT_LINE_WIDTH,
    HOVER_TOLERANCE_SCALE, JUNCTION_POINT_RADIUS, MAX_ZOOM, MIN_BRANCH_POINTS, MIN_ZOOM,
    PIN_HIT_RADIUS, PIN_MARKER_RADIUS, SEGMENT_HIT_TOLERANCE, SNAP_THRESHOLD,
};
use crate::map::persistence::DecodeOptions;
use crate::map::style::StyleDefaults;
use crate::map::{HitRadii, MarkerRadii};

/// System set for config loading (other plugins can run after this)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigLoaded;

/// Tunables for hit testing, drawing, and decoding. Distances are view pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorSettings {
    pub pin_hit_radius: f32,
    pub pin_marker_radius: f32,
    pub control_point_radius: f32,
    pub junction_radius: f32,
    pub segment_tolerance: f32,
    /// Hover tolerances are the click tolerances times this factor
    pub hover_tolerance_scale: f32,
    pub snapping_enabled: bool,
    pub snap_threshold: f32,
    pub min_branch_points: usize,
    pub creation_suppression_ms: u64,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub default_line_color: String,
    pub default_line_width: u32,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            pin_hit_radius: PIN_HIT_RADIUS,
            pin_marker_radius: PIN_MARKER_RADIUS,
            control_point_radius: CONTROL_POINT_RADIUS,
            junction_radius: JUNCTION_POINT_RADIUS,
            segment_tolerance: SEGMENT_HIT_TOLERANCE,
            hover_tolerance_scale: HOVER_TOLERANCE_SCALE,
            snapping_enabled: true,
            snap_threshold: SNAP_THRESHOLD,
            min_branch_points: MIN_BRANCH_POINTS,
            creation_suppression_ms: CREATION_SUPPRESSION_MS,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            default_line_color: DEFAULT_LINE_COLOR.to_string(),
            default_line_width: DEFAULT_LINE_WIDTH,
        }
    }
}

impl EditorSettings {
    /// Click tolerances in view pixels.
    pub fn hit_radii(&self) -> HitRadii {
        HitRadii {
            pin: self.pin_hit_radius,
            control_point: self.control_point_radius,
            junction: self.junction_radius,
            segment: self.segment_tolerance,
        }
    }

    pub fn marker_radii(&self) -> MarkerRadii {
        MarkerRadii {
            pin: self.pin_marker_radius,
            control_point: self.control_point_radius,
            junction: self.junction_radius,
        }
    }

    pub fn suppression(&self) -> Duration {
        Duration::from_millis(self.creation_suppression_ms)
    }

    pub fn min_branch_points(&self) -> usize {
        self.min_branch_points.max(MIN_BRANCH_POINTS)
    }

    pub fn style_defaults(&self) -> StyleDefaults {
        StyleDefaults {
            color: self.default_line_color.clone(),
            width: self.default_line_width.max(1),
        }
    }

    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            min_branch_points: self.min_branch_points(),
            style_defaults: self.style_defaults(),
        }
    }
}

/// Application configuration persisted to disk
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfigData {
    /// Directory holding map documents (defaults to the data dir's `maps/`)
    #[serde(default)]
    pub store_dir: Option<PathBuf>,

    /// Last opened map id (reopened on startup)
    #[serde(default)]
    pub last_map_id: Option<String>,

    #[serde(default)]
    pub editor: EditorSettings,
}

/// Runtime configuration resource
#[derive(Resource)]
pub struct AppConfig {
    /// The persisted configuration data
    pub data: AppConfigData,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Whether config needs to be saved (dirty flag)
    pub dirty: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: AppConfigData::default(),
            config_path: get_config_path(),
            dirty: false,
        }
    }
}

/// Resource to notify user when config was reset to defaults
#[derive(Resource, Default)]
pub struct ConfigResetNotification {
    /// Whether to show the notification dialog
    pub show: bool,
    /// The reason for the reset (parse error, read error, etc.)
    pub reason: Option<String>,
}

/// Message to trigger config save
#[derive(Message)]
pub struct SaveConfigRequest;

/// Message to update the last map id in config
#[derive(Message)]
pub struct UpdateLastMapRequest {
    pub map_id: String,
}

/// Get the path to the config file (platform-appropriate location)
fn get_config_path() -> PathBuf {
    crate::paths::config_file()
}

/// Result of loading config from disk
struct LoadConfigResult {
    data: AppConfigData,
    /// Error message if config was reset to defaults due to an error
    reset_reason: Option<String>,
}

/// Parse config text, falling back to defaults with a reason on error
fn parse_config(json: &str) -> LoadConfigResult {
    match serde_json::from_str(json) {
        Ok(data) => LoadConfigResult {
            data,
            reset_reason: None,
        },
        Err(e) => {
            warn!("Failed to parse config file: {}", e);
            LoadConfigResult {
                data: AppConfigData::default(),
                reset_reason: Some(format!("Configuration file was corrupted: {}", e)),
            }
        }
    }
}

/// Load configuration from disk
fn load_config(config_path: &PathBuf) -> LoadConfigResult {
    if !config_path.exists() {
        info!("No config file found, using defaults");
        return LoadConfigResult {
            data: AppConfigData::default(),
            reset_reason: None,
        };
    }

    match std::fs::read_to_string(config_path) {
        Ok(json) => {
            let result = parse_config(&json);
            if result.reset_reason.is_none() {
                info!("Loaded config from {:?}", config_path);
            }
            result
        }
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            LoadConfigResult {
                data: AppConfigData::default(),
                reset_reason: Some(format!("Could not read configuration file: {}", e)),
            }
        }
    }
}

/// Save configuration to disk
fn save_config(config: &AppConfig) {
    match serde_json::to_string_pretty(&config.data) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&config.config_path, json) {
                error!("Failed to save config: {}", e);
            } else {
                info!("Config saved to {:?}", config.config_path);
            }
        }
        Err(e) => {
            error!("Failed to serialize config: {}", e);
        }
    }
}

/// Startup system to load config from disk into the existing resource
fn load_config_system(
    mut config: ResMut<AppConfig>,
    mut reset_notification: ResMut<ConfigResetNotification>,
) {
    let config_path = get_config_path();
    let result = load_config(&config_path);
    config.data = result.data;
    config.config_path = config_path;
    config.dirty = false;

    // Set notification if config was reset due to an error
    if let Some(reason) = result.reset_reason {
        reset_notification.show = true;
        reset_notification.reason = Some(reason);
    }
}

/// System to save config when requested
fn save_config_system(
    mut events: MessageReader<SaveConfigRequest>,
    mut config: ResMut<AppConfig>,
) {
    for _ in events.read() {
        if config.dirty {
            save_config(&config);
            config.dirty = false;
        }
    }
}

/// System to update last map id
fn update_last_map_system(
    mut events: MessageReader<UpdateLastMapRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    for event in events.read() {
        if config.data.last_map_id.as_deref() == Some(event.map_id.as_str()) {
            continue;
        }
        config.data.last_map_id = Some(event.map_id.clone());
        config.dirty = true;
        save_events.write(SaveConfigRequest);
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AppConfig>()
            .init_resource::<ConfigResetNotification>()
            .add_message::<SaveConfigRequest>()
            .add_message::<UpdateLastMapRequest>()
            .add_systems(Startup, load_config_system.in_set(ConfigLoaded))
            .add_systems(
                Update,
                (
                    update_last_map_system.run_if(on_message::<UpdateLastMapRequest>),
                    save_config_system.run_if(on_message::<SaveConfigRequest>),
                )
                    .chain(),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_data_default() {
        let data = AppConfigData::default();
        assert!(data.store_dir.is_none());
        assert!(data.last_map_id.is_none());
        assert_eq!(data.editor, EditorSettings::default());
    }

    #[test]
    fn test_app_config_data_serialization() {
        let mut data = AppConfigData {
            store_dir: Some(PathBuf::from("/path/to/maps")),
            last_map_id: Some("world".to_string()),
            editor: EditorSettings::default(),
        };
        data.editor.snap_threshold = 20.0;

        let json = serde_json::to_string(&data).unwrap();
        let parsed: AppConfigData = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.store_dir, data.store_dir);
        assert_eq!(parsed.last_map_id, data.last_map_id);
        assert_eq!(parsed.editor.snap_threshold, 20.0);
    }

    #[test]
    fn test_partial_editor_settings_keep_defaults() {
        let result = parse_config(r#"{"editor": {"segment_tolerance": 4.0}}"#);
        assert!(result.reset_reason.is_none());
        assert_eq!(result.data.editor.segment_tolerance, 4.0);
        assert_eq!(result.data.editor.pin_hit_radius, PIN_HIT_RADIUS);
        assert_eq!(result.data.editor.min_branch_points, MIN_BRANCH_POINTS);
    }

    #[test]
    fn test_corrupt_config_resets_with_reason() {
        let result = parse_config("{not json");
        assert!(result.reset_reason.is_some());
        assert!(result.data.last_map_id.is_none());
    }

    #[test]
    fn test_min_branch_points_never_below_two() {
        let settings = EditorSettings {
            min_branch_points: 0,
            ..Default::default()
        };
        assert_eq!(settings.min_branch_points(), 2);
        assert_eq!(settings.decode_options().min_branch_points, 2);
    }

    #[test]
    fn test_suppression_window() {
        let settings = EditorSettings::default();
        assert_eq!(settings.suppression(), Duration::from_millis(500));
    }
}
