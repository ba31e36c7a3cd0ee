use std::io::Read;

use appendix_shared::{AppendixError, Result};

use crate::line::LineFilter;
use crate::{FilterStage, ParamDoc, StageParams};

/// Replaces each tab character with a fixed number of spaces.
pub struct TabToSpaces;

const DEFAULT_TAB_LENGTH: usize = 8;

const PARAMS: &[ParamDoc] = &[ParamDoc::optional("tablength", "spaces per tab (default 8)")];

impl FilterStage for TabToSpaces {
    fn name(&self) -> &str {
        "tab_to_spaces"
    }

    fn description(&self) -> &str {
        "replace tab characters with spaces"
    }

    fn params(&self) -> &[ParamDoc] {
        PARAMS
    }

    fn wrap(&self, input: Box<dyn Read>, params: &StageParams) -> Result<Box<dyn Read>> {
        let width = params.parse_or("tablength", DEFAULT_TAB_LENGTH)?;
        if width > 64 {
            return Err(AppendixError::filter(format!("tablength {width} is out of range")));
        }
        let spaces = " ".repeat(width);
        Ok(Box::new(LineFilter::new(input, move |line| line.replace('\t', &spaces))))
    }
}
