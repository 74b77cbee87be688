//! Host-supplied configuration and its defaults.
//!
//! A host rarely wants to specify everything up front — most embeds start
//! from the defaults and override a handful of fields. [`PartialHostConfig`]
//! mirrors [`HostConfig`] with every field optional (nested sections
//! included) so a host's partial JSON merges cleanly over the defaults
//! instead of requiring a full, verbose config object every time.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Visual theming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeConfig {
    /// Named theme, e.g. `"light"`, `"dark"`, `"system"`.
    pub name: String,
    /// A host-supplied CSS custom-property override map, passed through
    /// verbatim to the renderer.
    pub accent_color: Option<String>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: "system".to_string(),
            accent_color: None,
        }
    }
}

/// Theming overrides; absent fields keep the base value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialThemeConfig {
    /// Override for [`ThemeConfig::name`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Override for [`ThemeConfig::accent_color`]; `Some(None)` clears it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<Option<String>>,
}

/// Component loading behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LazyLoadConfig {
    /// Whether lazily-registered components are fetched eagerly on
    /// registry construction instead of on first reference.
    pub eager: bool,
    /// Timeout, in milliseconds, for a single lazy component fetch.
    pub timeout_ms: u64,
}

impl Default for LazyLoadConfig {
    fn default() -> Self {
        Self {
            eager: false,
            timeout_ms: 5_000,
        }
    }
}

/// Lazy-loading overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialLazyLoadConfig {
    /// Override for [`LazyLoadConfig::eager`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eager: Option<bool>,
    /// Override for [`LazyLoadConfig::timeout_ms`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Pattern-detection transformer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformerConfig {
    /// `"off"`, `"passive"`, or `"auto"`.
    pub mode: String,
    /// Matches below this confidence are dropped before overlap resolution.
    pub confidence_threshold: f64,
    /// Detector names to disable even if built in.
    pub disabled_detectors: Vec<String>,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            mode: "auto".to_string(),
            confidence_threshold: 0.5,
            disabled_detectors: Vec::new(),
        }
    }
}

/// Transformer overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialTransformerConfig {
    /// Override for [`TransformerConfig::mode`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Override for [`TransformerConfig::confidence_threshold`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_threshold: Option<f64>,
    /// Override for [`TransformerConfig::disabled_detectors`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_detectors: Option<Vec<String>>,
}

/// Markdown parsing limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownConfig {
    /// Maximum accepted size, in bytes, of a directive's JSON body.
    pub max_directive_json_size: usize,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            max_directive_json_size: crate::directive_resolve::DEFAULT_MAX_JSON_SIZE,
        }
    }
}

/// Markdown overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialMarkdownConfig {
    /// Override for [`MarkdownConfig::max_directive_json_size`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_directive_json_size: Option<usize>,
}

/// Static-render output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RendererConfig {
    /// Whether a prose-typography wrapper class is added around rendered
    /// text blocks.
    pub typography: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self { typography: true }
    }
}

/// Renderer overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialRendererConfig {
    /// Override for [`RendererConfig::typography`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typography: Option<bool>,
}

/// Incremental-render cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingConfig {
    /// Whether text renders are coalesced to once per frame (`true`) or
    /// rendered synchronously on every `push` (`false`), useful for tests
    /// and non-interactive hosts.
    pub coalesce_frames: bool,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            coalesce_frames: true,
        }
    }
}

/// Streaming overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialStreamingConfig {
    /// Override for [`StreamingConfig::coalesce_frames`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coalesce_frames: Option<bool>,
}

/// Action-routing policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionsConfig {
    /// Whether actions are sent immediately or held for confirmation.
    pub auto_send: bool,
    /// Per-component `label` recomputation templates, keyed by the
    /// directive type name that raised the action. A template's only
    /// placeholder is `{value}`, substituted with the action's value
    /// rendered as plain text; a component with no registered template
    /// keeps whatever `label` it was dispatched with.
    pub label_templates: BTreeMap<String, String>,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            auto_send: true,
            label_templates: BTreeMap::new(),
        }
    }
}

/// Action overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialActionsConfig {
    /// Override for [`ActionsConfig::auto_send`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_send: Option<bool>,
    /// Templates to merge into (not replace) the existing set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_templates: Option<BTreeMap<String, String>>,
}

/// Trust boundaries for rendered content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityConfig {
    /// Component types allowed to be materialised. Empty means "no
    /// allowlist" (the registry's own contents are the only restriction).
    pub allowed_component_types: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_component_types: Vec::new(),
        }
    }
}

/// Security overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialSecurityConfig {
    /// Override for [`SecurityConfig::allowed_component_types`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_component_types: Option<Vec<String>>,
}

/// The full, concrete configuration a host embeds this crate with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfig {
    /// BCP-47 locale tag, e.g. `"en-US"`.
    pub locale: String,
    /// Verbose event-bus logging.
    pub debug: bool,
    /// Visual theming.
    pub theme: ThemeConfig,
    /// Component loading behaviour.
    pub lazy_load: LazyLoadConfig,
    /// Pattern-detection transformer settings.
    pub transformer: TransformerConfig,
    /// Markdown parsing limits.
    pub markdown: MarkdownConfig,
    /// Static-render output settings.
    pub renderer: RendererConfig,
    /// Incremental-render cadence.
    pub streaming: StreamingConfig,
    /// Action-routing policy.
    pub actions: ActionsConfig,
    /// Trust boundaries for rendered content.
    pub security: SecurityConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            debug: false,
            theme: ThemeConfig::default(),
            lazy_load: LazyLoadConfig::default(),
            transformer: TransformerConfig::default(),
            markdown: MarkdownConfig::default(),
            renderer: RendererConfig::default(),
            streaming: StreamingConfig::default(),
            actions: ActionsConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl HostConfig {
    /// Builds configuration from `LIVELLM_*` environment variables layered
    /// over the defaults, mirroring the common `Config::from_env`
    /// constructor pattern: `LIVELLM_LOCALE`, `LIVELLM_DEBUG`,
    /// `LIVELLM_TRANSFORMER_MODE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(locale) = std::env::var("LIVELLM_LOCALE") {
            config.locale = locale;
        }
        if let Ok(debug) = std::env::var("LIVELLM_DEBUG") {
            config.debug = debug == "1" || debug.eq_ignore_ascii_case("true");
        }
        if let Ok(mode) = std::env::var("LIVELLM_TRANSFORMER_MODE") {
            config.transformer.mode = mode;
        }
        config
    }

    /// Applies `partial` over `self`, overriding only the fields it sets.
    pub fn merge(&mut self, partial: PartialHostConfig) {
        if let Some(locale) = partial.locale {
            self.locale = locale;
        }
        if let Some(debug) = partial.debug {
            self.debug = debug;
        }
        if let Some(theme) = partial.theme {
            if let Some(name) = theme.name {
                self.theme.name = name;
            }
            if let Some(accent_color) = theme.accent_color {
                self.theme.accent_color = accent_color;
            }
        }
        if let Some(lazy_load) = partial.lazy_load {
            if let Some(eager) = lazy_load.eager {
                self.lazy_load.eager = eager;
            }
            if let Some(timeout_ms) = lazy_load.timeout_ms {
                self.lazy_load.timeout_ms = timeout_ms;
            }
        }
        if let Some(transformer) = partial.transformer {
            if let Some(mode) = transformer.mode {
                self.transformer.mode = mode;
            }
            if let Some(confidence_threshold) = transformer.confidence_threshold {
                self.transformer.confidence_threshold = confidence_threshold;
            }
            if let Some(disabled_detectors) = transformer.disabled_detectors {
                self.transformer.disabled_detectors = disabled_detectors;
            }
        }
        if let Some(markdown) = partial.markdown {
            if let Some(max_size) = markdown.max_directive_json_size {
                self.markdown.max_directive_json_size = max_size;
            }
        }
        if let Some(renderer) = partial.renderer {
            if let Some(typography) = renderer.typography {
                self.renderer.typography = typography;
            }
        }
        if let Some(streaming) = partial.streaming {
            if let Some(coalesce_frames) = streaming.coalesce_frames {
                self.streaming.coalesce_frames = coalesce_frames;
            }
        }
        if let Some(actions) = partial.actions {
            if let Some(auto_send) = actions.auto_send {
                self.actions.auto_send = auto_send;
            }
            if let Some(label_templates) = actions.label_templates {
                self.actions.label_templates.extend(label_templates);
            }
        }
        if let Some(security) = partial.security {
            if let Some(allowed) = security.allowed_component_types {
                self.security.allowed_component_types = allowed;
            }
        }
    }

    /// Checks internally-consistent invariants a malformed host config
    /// could violate: a confidence threshold outside `[0, 1]`, an empty
    /// locale, or a zero-byte JSON size cap.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.locale.trim().is_empty() {
            return Err(CoreError::Programmer("locale must not be empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.transformer.confidence_threshold) {
            return Err(CoreError::Programmer(
                "transformer.confidenceThreshold must be between 0 and 1".to_string(),
            ));
        }
        if self.markdown.max_directive_json_size == 0 {
            return Err(CoreError::Programmer(
                "markdown.maxDirectiveJsonSize must be greater than zero".to_string(),
            ));
        }
        if !matches!(self.transformer.mode.as_str(), "off" | "passive" | "auto") {
            return Err(CoreError::Programmer(format!(
                "transformer.mode must be one of off/passive/auto, got \"{}\"",
                self.transformer.mode
            )));
        }
        Ok(())
    }
}

/// A host-supplied partial override of [`HostConfig`], deep-mergeable via
/// [`HostConfig::merge`]. Every field (including nested sections) is
/// optional so a host only sends what it wants to change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialHostConfig {
    /// Override for [`HostConfig::locale`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Override for [`HostConfig::debug`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    /// Override for [`HostConfig::theme`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<PartialThemeConfig>,
    /// Override for [`HostConfig::lazy_load`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lazy_load: Option<PartialLazyLoadConfig>,
    /// Override for [`HostConfig::transformer`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformer: Option<PartialTransformerConfig>,
    /// Override for [`HostConfig::markdown`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<PartialMarkdownConfig>,
    /// Override for [`HostConfig::renderer`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renderer: Option<PartialRendererConfig>,
    /// Override for [`HostConfig::streaming`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streaming: Option<PartialStreamingConfig>,
    /// Override for [`HostConfig::actions`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<PartialActionsConfig>,
    /// Override for [`HostConfig::security`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<PartialSecurityConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_cleanly() {
        assert!(HostConfig::default().validate().is_ok());
    }

    #[test]
    fn merge_only_overrides_the_fields_present() {
        let mut config = HostConfig::default();
        let original_locale = config.locale.clone();
        let partial = PartialHostConfig {
            transformer: Some(PartialTransformerConfig {
                confidence_threshold: Some(0.8),
                ..Default::default()
            }),
            ..Default::default()
        };
        config.merge(partial);
        assert_eq!(config.locale, original_locale);
        assert_eq!(config.transformer.confidence_threshold, 0.8);
        assert_eq!(config.transformer.mode, "auto");
    }

    #[test]
    fn an_out_of_range_confidence_threshold_fails_validation() {
        let mut config = HostConfig::default();
        config.transformer.confidence_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn an_unknown_transformer_mode_fails_validation() {
        let mut config = HostConfig::default();
        config.transformer.mode = "eager".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn merging_a_nullable_field_can_set_it_to_none() {
        let mut config = HostConfig::default();
        config.theme.accent_color = Some("#ff0000".to_string());
        let partial = PartialHostConfig {
            theme: Some(PartialThemeConfig {
                accent_color: Some(None),
                ..Default::default()
            }),
            ..Default::default()
        };
        config.merge(partial);
        assert_eq!(config.theme.accent_color, None);
    }

    #[test]
    fn label_templates_merge_additively_rather_than_replacing() {
        let mut config = HostConfig::default();
        config.actions.label_templates.insert("confirm".into(), "Confirmed: {value}".into());
        let mut incoming = BTreeMap::new();
        incoming.insert("choice".into(), "Picked: {value}".into());
        let partial = PartialHostConfig {
            actions: Some(PartialActionsConfig {
                label_templates: Some(incoming),
                ..Default::default()
            }),
            ..Default::default()
        };
        config.merge(partial);
        assert_eq!(config.actions.label_templates.len(), 2);
        assert_eq!(
            config.actions.label_templates.get("confirm").map(String::as_str),
            Some("Confirmed: {value}")
        );
    }
}
