use std::io::Read;

use appendix_shared::Result;

use crate::line::LineFilter;
use crate::{FilterStage, ParamDoc, StageParams};

/// Prepends a fixed string to every line.
pub struct PrefixLines;

const PARAMS: &[ParamDoc] = &[ParamDoc::required("prefix", "text inserted at the start of each line")];

impl FilterStage for PrefixLines {
    fn name(&self) -> &str {
        "prefix_lines"
    }

    fn description(&self) -> &str {
        "prepend a prefix to every line"
    }

    fn params(&self) -> &[ParamDoc] {
        PARAMS
    }

    fn wrap(&self, input: Box<dyn Read>, params: &StageParams) -> Result<Box<dyn Read>> {
        let prefix = params.required("prefix")?.to_string();
        Ok(Box::new(LineFilter::new(input, move |line| format!("{prefix}{line}"))))
    }
}
