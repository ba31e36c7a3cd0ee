use std::collections::BTreeMap;
use std::io::Read;

use appendix_shared::{AppendixError, Result};

use crate::line::LineFilter;
use crate::{FilterStage, ParamDoc, StageParams};

/// Replaces `@KEY@`-style tokens with configured values.
///
/// Tokens are declared as `token.KEY = value`. A delimited name with no
/// matching token is left untouched.
pub struct ReplaceTokens;

const PARAMS: &[ParamDoc] = &[
    ParamDoc::optional("begintoken", "token start delimiter (default @)"),
    ParamDoc::optional("endtoken", "token end delimiter (default @)"),
    ParamDoc::optional("token.*", "value substituted for token *"),
];

impl FilterStage for ReplaceTokens {
    fn name(&self) -> &str {
        "replace_tokens"
    }

    fn description(&self) -> &str {
        "substitute delimited tokens with values"
    }

    fn params(&self) -> &[ParamDoc] {
        PARAMS
    }

    fn wrap(&self, input: Box<dyn Read>, params: &StageParams) -> Result<Box<dyn Read>> {
        let begin = params.get_or("begintoken", "@").to_string();
        let end = params.get_or("endtoken", "@").to_string();
        if begin.is_empty() || end.is_empty() {
            return Err(AppendixError::filter("token delimiters must not be empty"));
        }

        let tokens: BTreeMap<String, String> = params
            .with_prefix("token.")
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Ok(Box::new(LineFilter::new(input, move |line| {
            replace_line(line, &begin, &end, &tokens)
        })))
    }
}

fn replace_line(line: &str, begin: &str, end: &str, tokens: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(start) = rest.find(begin) {
        out.push_str(&rest[..start]);
        let after = &rest[start + begin.len()..];

        match after.find(end).and_then(|stop| tokens.get(&after[..stop]).map(|v| (stop, v))) {
            Some((stop, value)) => {
                out.push_str(value);
                rest = &after[stop + end.len()..];
            }
            None => {
                // Not a known token: emit the delimiter and rescan after it.
                out.push_str(begin);
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
