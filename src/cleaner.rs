use serde::{
  Deserialize,
  Serialize
};
use tracing::trace;

use crate::rules::{
  Rule,
  is_blank
};

/// Which rules run. Every flag defaults
/// to enabled, also when a key is
/// missing from a loaded config.
#[derive(
  Clone,
  Copy,
  Debug,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(deny_unknown_fields)]
pub struct CleaningConfig {
  #[serde(default = "default_true")]
  pub remove_reference_marks: bool,
  #[serde(default = "default_true")]
  pub remove_extra_spaces:    bool,
  #[serde(default = "default_true")]
  pub remove_newlines:        bool,
  #[serde(default = "default_true")]
  pub convert_full_width:     bool
}

impl Default for CleaningConfig {
  fn default() -> Self {
    Self::all_enabled()
  }
}

impl CleaningConfig {
  pub fn all_enabled() -> Self {
    Self::uniform(true)
  }

  pub fn all_disabled() -> Self {
    Self::uniform(false)
  }

  /// Exactly the given rules enabled.
  pub fn only(
    rules: &[Rule]
  ) -> Self {
    let mut config =
      Self::all_disabled();
    for rule in rules {
      config.set(*rule, true);
    }
    config
  }

  fn uniform(enabled: bool) -> Self {
    Self {
      remove_reference_marks: enabled,
      remove_extra_spaces:    enabled,
      remove_newlines:        enabled,
      convert_full_width:     enabled
    }
  }

  pub fn is_enabled(
    &self,
    rule: Rule
  ) -> bool {
    match rule {
      | Rule::ReferenceMarks => {
        self.remove_reference_marks
      }
      | Rule::ExtraSpaces => {
        self.remove_extra_spaces
      }
      | Rule::Newlines => {
        self.remove_newlines
      }
      | Rule::FullWidth => {
        self.convert_full_width
      }
    }
  }

  pub fn set(
    &mut self,
    rule: Rule,
    enabled: bool
  ) {
    let flag = match rule {
      | Rule::ReferenceMarks => {
        &mut self.remove_reference_marks
      }
      | Rule::ExtraSpaces => {
        &mut self.remove_extra_spaces
      }
      | Rule::Newlines => {
        &mut self.remove_newlines
      }
      | Rule::FullWidth => {
        &mut self.convert_full_width
      }
    };
    *flag = enabled;
  }

  /// Enabled rules in pipeline order.
  pub fn enabled_rules(
    &self
  ) -> Vec<Rule> {
    Rule::ORDER
      .into_iter()
      .filter(|rule| {
        self.is_enabled(*rule)
      })
      .collect()
  }
}

/// Stateless cleanup pipeline. Holds
/// nothing; the config travels with
/// each call.
#[derive(
  Clone, Copy, Debug, Default,
)]
pub struct TextCleaner;

impl TextCleaner {
  pub fn new() -> Self {
    Self
  }

  /// Applies the enabled rules in
  /// [`Rule::ORDER`], then trims.
  ///
  /// Spaces are deleted outright when
  /// `remove_extra_spaces` is on, so
  /// `"a  b"` becomes `"ab"`, not
  /// `"a b"`.
  pub fn clean(
    &self,
    input: &str,
    config: &CleaningConfig
  ) -> String {
    let mut text = input.to_string();
    for rule in config.enabled_rules() {
      let before = text.len();
      text = rule.apply(&text);
      trace!(
        rule = %rule,
        before,
        after = text.len(),
        "applied cleanup rule"
      );
    }
    trim(&text).to_string()
  }
}

pub fn clean(
  input: &str,
  config: &CleaningConfig
) -> String {
  TextCleaner::new().clean(input, config)
}

fn trim(text: &str) -> &str {
  text.trim_matches(is_blank)
}

fn default_true() -> bool {
  true
}
