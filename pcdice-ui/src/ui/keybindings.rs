use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::action_id::parse_action_id;
use super::keymap::{KeyBinding, KeyPattern, Keymap};
use super::layer::Layer;
use super::KeyCode;

/// Raw TOML structure for the keybindings config file
#[derive(Deserialize)]
struct KeybindingConfig {
    #[allow(dead_code)]
    version: u32,
    layers: HashMap<String, LayerConfig>,
}

#[derive(Deserialize)]
struct LayerConfig {
    #[serde(default = "default_transparent")]
    transparent: bool,
    bindings: Vec<RawBinding>,
}

fn default_transparent() -> bool {
    true
}

/// A single binding entry from TOML
#[derive(Deserialize)]
struct RawBinding {
    key: String,
    action: String,
    description: String,
}

/// Intern a String into a &'static str.
/// These are loaded once at startup and never freed.
fn intern(s: String) -> &'static str {
    Box::leak(s.into_boxed_str())
}

/// Parse a key notation string into a KeyPattern.
///
/// Supported formats:
/// - `"q"` → Char('q')
/// - `"Up"` → Key(KeyCode::Up)
/// - `"Ctrl+s"` → Ctrl('s')
/// - `"Alt+x"` → Alt('x')
/// - `"Ctrl+Left"` → CtrlKey(KeyCode::Left)
/// - `"Shift+Up"` → ShiftKey(KeyCode::Up)
/// - `"F1"` → Key(KeyCode::F(1))
///
/// Returns `None` for unrecognised key names (e.g. from a malformed user config).
fn parse_key(s: &str) -> Option<KeyPattern> {
    if let Some(rest) = s.strip_prefix("Ctrl+") {
        match single_char(rest) {
            Some(c) => Some(KeyPattern::Ctrl(c)),
            None => parse_named_key(rest).map(KeyPattern::CtrlKey),
        }
    } else if let Some(rest) = s.strip_prefix("Alt+") {
        single_char(rest).map(KeyPattern::Alt)
    } else if let Some(rest) = s.strip_prefix("Shift+") {
        parse_named_key(rest).map(KeyPattern::ShiftKey)
    } else if let Some(c) = single_char(s) {
        Some(KeyPattern::Char(c))
    } else if s == "Space" {
        Some(KeyPattern::Char(' '))
    } else {
        parse_named_key(s).map(KeyPattern::Key)
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Parse a named key string (e.g., "Up", "Enter", "F1") into a KeyCode.
/// Returns `None` for unrecognised key names.
fn parse_named_key(s: &str) -> Option<KeyCode> {
    match s {
        "Up" => Some(KeyCode::Up),
        "Down" => Some(KeyCode::Down),
        "Left" => Some(KeyCode::Left),
        "Right" => Some(KeyCode::Right),
        "Enter" => Some(KeyCode::Enter),
        "Escape" => Some(KeyCode::Escape),
        "Backspace" => Some(KeyCode::Backspace),
        "Tab" => Some(KeyCode::Tab),
        "BackTab" => Some(KeyCode::BackTab),
        "Home" => Some(KeyCode::Home),
        "End" => Some(KeyCode::End),
        "PageUp" => Some(KeyCode::PageUp),
        "PageDown" => Some(KeyCode::PageDown),
        "Insert" => Some(KeyCode::Insert),
        "Delete" => Some(KeyCode::Delete),
        _ if s.starts_with('F') => s[1..].parse::<u8>().ok().map(KeyCode::F),
        _ => None,
    }
}

/// Embedded default keybindings TOML
const DEFAULT_KEYBINDINGS: &str = include_str!("../../keybindings.toml");

/// Load keybindings: embedded default, optionally merged with user override.
pub fn load_keybindings() -> Vec<Layer> {
    load_keybindings_from(user_keybindings_path().as_deref())
}

pub fn load_keybindings_from(user_path: Option<&Path>) -> Vec<Layer> {
    let mut config: KeybindingConfig =
        toml::from_str(DEFAULT_KEYBINDINGS).expect("Failed to parse embedded keybindings.toml");

    if let Some(path) = user_path {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match toml::from_str::<KeybindingConfig>(&contents) {
                    Ok(user_config) => merge_config(&mut config, user_config),
                    Err(e) => log::warn!(
                        target: "ui::keybindings",
                        "ignoring malformed keybindings {}: {}",
                        path.display(),
                        e
                    ),
                },
                Err(e) => log::warn!(
                    target: "ui::keybindings",
                    "could not read keybindings {}: {}",
                    path.display(),
                    e
                ),
            }
        }
    }

    build_layers(&config.layers)
}

fn user_keybindings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pcdice").join("keybindings.toml"))
}

/// Merge user config into the base config.
/// User layer entries fully replace the default layer entries.
fn merge_config(base: &mut KeybindingConfig, user: KeybindingConfig) {
    for (layer_id, layer_config) in user.layers {
        base.layers.insert(layer_id, layer_config);
    }
}

fn build_bindings(layer_name: &str, raw: &[RawBinding]) -> Vec<KeyBinding> {
    raw.iter()
        .filter_map(|b| {
            let pattern = match parse_key(&b.key) {
                Some(p) => p,
                None => {
                    log::warn!(target: "ui::keybindings", "ignoring unknown key '{}' in keybindings", b.key);
                    return None;
                }
            };
            match parse_action_id(layer_name, &b.action) {
                Some(action_id) => Some(KeyBinding {
                    pattern,
                    action: action_id,
                    description: intern(b.description.clone()),
                }),
                None => {
                    log::warn!(target: "ui::keybindings", "ignoring unknown action '{}' in layer '{}'", b.action, layer_name);
                    None
                }
            }
        })
        .collect()
}

fn build_layers(layers: &HashMap<String, LayerConfig>) -> Vec<Layer> {
    layers
        .iter()
        .map(|(name, config)| Layer {
            name: intern(name.clone()),
            keymap: Keymap::from_bindings(build_bindings(name, &config.bindings)),
            transparent: config.transparent,
        })
        .collect()
}
