use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use once_cell::sync::Lazy;
use regex::Regex;

/// First code point of the full-width
/// ASCII variants block (`！`).
const FULL_WIDTH_START: u32 = 0xFF01;
/// Last code point of the block (`～`).
const FULL_WIDTH_END: u32 = 0xFF5E;
/// Distance between a full-width form
/// and its ASCII counterpart.
const FULL_WIDTH_OFFSET: u32 = 0xFEE0;

// Mark bodies: ASCII digits, commas,
// hyphens, and blanks as `is_blank`
// defines them. U+0085 is excluded.
const MARK_BODY: &str = concat!(
  r"[0-9,\t\n\x0B\x0C\r \x{A0}",
  r"\x{1680}\x{2000}-\x{200A}",
  r"\x{2028}\x{2029}\x{202F}",
  r"\x{205F}\x{3000}\x{FEFF}-]+"
);

static SQUARE_MARK: Lazy<Regex> =
  Lazy::new(|| {
    Regex::new(&format!(
      r"\[{MARK_BODY}\]"
    ))
    .expect("square mark pattern")
  });

static ROUND_MARK: Lazy<Regex> =
  Lazy::new(|| {
    Regex::new(&format!(
      r"\({MARK_BODY}\)"
    ))
    .expect("round mark pattern")
  });

/// Blank characters for mark bodies and
/// the final trim: Unicode `White_Space`
/// minus U+0085, plus U+FEFF.
pub const fn is_blank(c: char) -> bool {
  matches!(
    c,
    '\t'
      | '\n'
      | '\u{0B}'
      | '\u{0C}'
      | '\r'
      | ' '
      | '\u{A0}'
      | '\u{1680}'
      | '\u{2000}'..='\u{200A}'
      | '\u{2028}'
      | '\u{2029}'
      | '\u{202F}'
      | '\u{205F}'
      | '\u{3000}'
      | '\u{FEFF}'
  )
}

#[derive(
  Debug,
  Clone,
  Copy,
  ValueEnum,
  PartialEq,
  Eq,
  Hash,
)]
pub enum Rule {
  ReferenceMarks,
  ExtraSpaces,
  Newlines,
  FullWidth
}

impl Rule {
  /// Pipeline order. Later rules see
  /// the output of earlier ones.
  pub const ORDER: [Rule; 4] = [
    Rule::ReferenceMarks,
    Rule::ExtraSpaces,
    Rule::Newlines,
    Rule::FullWidth
  ];

  pub fn name(self) -> &'static str {
    match self {
      | Rule::ReferenceMarks => {
        "reference-marks"
      }
      | Rule::ExtraSpaces => {
        "extra-spaces"
      }
      | Rule::Newlines => "newlines",
      | Rule::FullWidth => "full-width"
    }
  }

  pub fn description(
    self
  ) -> &'static str {
    match self {
      | Rule::ReferenceMarks => {
        "strip numeric citation marks \
         like [12] or (3-5)"
      }
      | Rule::ExtraSpaces => {
        "delete every ASCII space"
      }
      | Rule::Newlines => {
        "delete carriage returns and \
         line feeds"
      }
      | Rule::FullWidth => {
        "convert full-width ASCII \
         variants to half-width"
      }
    }
  }

  pub fn apply(
    self,
    input: &str
  ) -> String {
    match self {
      | Rule::ReferenceMarks => {
        remove_reference_marks(input)
      }
      | Rule::ExtraSpaces => {
        remove_spaces(input)
      }
      | Rule::Newlines => {
        remove_newlines(input)
      }
      | Rule::FullWidth => {
        convert_full_width(input)
      }
    }
  }
}

impl fmt::Display for Rule {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Rule {
  type Err = anyhow::Error;

  fn from_str(
    value: &str
  ) -> Result<Self, Self::Err> {
    let normalized =
      value.trim().to_lowercase();
    Rule::ORDER
      .into_iter()
      .find(|rule| {
        rule.name() == normalized
      })
      .ok_or_else(|| {
        anyhow::anyhow!(
          "unknown rule '{}' \
           (expected one of: {})",
          value,
          Rule::ORDER
            .map(Rule::name)
            .join(", ")
        )
      })
  }
}

/// Drops `[..]` spans holding only
/// digits, commas, hyphens and
/// whitespace, then `(..)` spans.
pub fn remove_reference_marks(
  input: &str
) -> String {
  let without_square =
    SQUARE_MARK.replace_all(input, "");
  ROUND_MARK
    .replace_all(&without_square, "")
    .into_owned()
}

/// Deletes every U+0020. Runs are
/// removed outright, not collapsed to
/// a single space.
pub fn remove_spaces(
  input: &str
) -> String {
  input.replace(' ', "")
}

pub fn remove_newlines(
  input: &str
) -> String {
  input
    .chars()
    .filter(|c| !matches!(c, '\r' | '\n'))
    .collect()
}

pub fn convert_full_width(
  input: &str
) -> String {
  input.chars().map(to_half_width).collect()
}

fn to_half_width(ch: char) -> char {
  let code = ch as u32;
  if (FULL_WIDTH_START..=FULL_WIDTH_END)
    .contains(&code)
  {
    char::from_u32(
      code - FULL_WIDTH_OFFSET
    )
    .unwrap_or(ch)
  } else {
    ch
  }
}
