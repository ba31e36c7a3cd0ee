use std::io::Read;

use appendix_shared::{AppendixError, Result};
use regex::RegexBuilder;

use crate::line::LineFilter;
use crate::{FilterStage, ParamDoc, StageParams};

/// Regular-expression search and replace, applied line by line.
pub struct ReplaceRegexp;

const PARAMS: &[ParamDoc] = &[
    ParamDoc::required("pattern", "regular expression to search for"),
    ParamDoc::optional("replace", "replacement text, $1 refers to groups (default empty)"),
    ParamDoc::optional("ignorecase", "case-insensitive matching (default false)"),
];

impl FilterStage for ReplaceRegexp {
    fn name(&self) -> &str {
        "replace_regexp"
    }

    fn description(&self) -> &str {
        "replace regular expression matches in every line"
    }

    fn params(&self) -> &[ParamDoc] {
        PARAMS
    }

    fn wrap(&self, input: Box<dyn Read>, params: &StageParams) -> Result<Box<dyn Read>> {
        let pattern = params.required("pattern")?;
        let replace = params.get_or("replace", "").to_string();
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(params.flag("ignorecase", false)?)
            .build()
            .map_err(|e| AppendixError::filter(format!("invalid pattern '{pattern}': {e}")))?;

        Ok(Box::new(LineFilter::new(input, move |line| {
            regex.replace_all(line, replace.as_str()).into_owned()
        })))
    }
}
