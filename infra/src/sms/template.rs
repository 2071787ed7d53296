//! Message templates with positional placeholders
//!
//! Template bodies reference arguments as `{0}`, `{1}`, ... in any order and
//! any number of times.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

use vk_core::errors::DispatchError;
use vk_shared::SmsConfig;

static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\d+)\}").expect("static regex"));

/// Upper bound of a rendered message body
pub const MAX_MESSAGE_LENGTH: usize = 1600;

/// Registry of message templates keyed by template id
#[derive(Debug, Clone, Default)]
pub struct SmsTemplates {
    templates: HashMap<String, String>,
}

impl SmsTemplates {
    pub fn new(templates: HashMap<String, String>) -> Self {
        Self { templates }
    }

    pub fn from_config(config: &SmsConfig) -> Self {
        Self::new(config.templates.clone())
    }

    /// Register or replace a template
    pub fn with_template(mut self, id: impl Into<String>, body: impl Into<String>) -> Self {
        self.templates.insert(id.into(), body.into());
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    /// Render `template_id` with `args`
    ///
    /// Unknown templates, placeholders without an argument and bodies over
    /// [`MAX_MESSAGE_LENGTH`] are invalid requests.
    pub fn render(&self, template_id: &str, args: &[String]) -> Result<String, DispatchError> {
        let body = self.templates.get(template_id).ok_or_else(|| {
            DispatchError::InvalidRequest(format!("unknown template '{}'", template_id))
        })?;

        let mut missing = None;
        let rendered = PLACEHOLDER_REGEX.replace_all(body, |caps: &Captures| {
            let arg = caps[1].parse::<usize>().ok().and_then(|i| args.get(i));
            match arg {
                Some(value) => value.clone(),
                None => {
                    missing.get_or_insert_with(|| caps[0].to_string());
                    String::new()
                }
            }
        });

        if let Some(placeholder) = missing {
            return Err(DispatchError::InvalidRequest(format!(
                "template '{}' has no argument for {}",
                template_id, placeholder
            )));
        }
        if rendered.len() > MAX_MESSAGE_LENGTH {
            return Err(DispatchError::InvalidRequest(format!(
                "message exceeds maximum length of {} characters",
                MAX_MESSAGE_LENGTH
            )));
        }

        Ok(rendered.into_owned())
    }
}
