//! Filter stages applied to file content while it is appended.
//!
//! A [`FilterStage`] wraps one byte stream in another. Stages are looked up by
//! name in a [`FilterRegistry`] and composed, in declaration order, into a
//! [`FilterChain`]. The chain is built once per run from unexpanded
//! parameter expressions and re-opened for every file: each time, the
//! parameters are expanded against the current [`DynamicContext`] so a stage
//! can see which file it is processing.

mod line;
mod params;
pub mod stages;

use std::collections::BTreeMap;
use std::io::Read;
use std::sync::Arc;

use appendix_shared::{AppendixError, DynamicContext, FilterChainSpec, Result};
use tracing::{debug, trace};

pub use params::{ParamDoc, StageParams};
pub use stages::{PrefixLines, ReplaceRegexp, ReplaceTokens, TabToSpaces};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// One named stream transformation.
pub trait FilterStage: Send + Sync {
    /// Name used to reference this stage from a task file.
    fn name(&self) -> &str;

    /// One-line description for `appendix filters`.
    fn description(&self) -> &str;

    /// Parameters this stage accepts.
    fn params(&self) -> &[ParamDoc];

    /// Wrap `input` in this stage's transformation.
    ///
    /// `params` have already been expanded for the current item.
    fn wrap(&self, input: Box<dyn Read>, params: &StageParams) -> Result<Box<dyn Read>>;

    /// Check a declaration before any item is streamed.
    ///
    /// The default implementation rejects unknown parameter names and missing
    /// required ones.
    fn validate(&self, params: &BTreeMap<String, String>) -> Result<()> {
        let docs = self.params();

        for key in params.keys() {
            if !docs.iter().any(|doc| doc.accepts(key)) {
                return Err(AppendixError::config(format!(
                    "filter '{}' has no parameter '{key}'",
                    self.name()
                )));
            }
        }
        for doc in docs.iter().filter(|doc| doc.required) {
            if !params.contains_key(doc.name) {
                return Err(AppendixError::config(format!(
                    "filter '{}' requires parameter '{}'",
                    self.name(),
                    doc.name
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Named stages available to task files.
pub struct FilterRegistry {
    stages: Vec<Arc<dyn FilterStage>>,
}

impl FilterRegistry {
    /// Create a registry with all built-in stages.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(PrefixLines));
        registry.register(Arc::new(ReplaceTokens));
        registry.register(Arc::new(ReplaceRegexp));
        registry.register(Arc::new(TabToSpaces));
        registry
    }

    /// Create a registry with no stages.
    pub fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    /// Add a stage, replacing any stage registered under the same name.
    pub fn register(&mut self, stage: Arc<dyn FilterStage>) {
        self.stages.retain(|s| s.name() != stage.name());
        self.stages.push(stage);
    }

    /// Look up a stage by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn FilterStage>> {
        self.stages.iter().find(|s| s.name() == name).cloned()
    }

    /// All registered stages in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn FilterStage> {
        self.stages.iter().map(|s| s.as_ref())
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

struct ConfiguredStage {
    stage: Arc<dyn FilterStage>,
    params: BTreeMap<String, String>,
}

/// An ordered list of configured stages, reusable across items.
#[derive(Default)]
pub struct FilterChain {
    stages: Vec<ConfiguredStage>,
}

impl FilterChain {
    /// A chain that passes content through unchanged.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve every declared stage against `registry`, flattening all chains
    /// in declaration order.
    ///
    /// Unknown stage names and invalid parameter sets are config errors.
    pub fn build(chains: &[FilterChainSpec], registry: &FilterRegistry) -> Result<Self> {
        let mut stages = Vec::new();

        for spec in chains.iter().flat_map(|chain| &chain.filters) {
            let stage = registry.get(&spec.name).ok_or_else(|| {
                AppendixError::config(format!("unknown filter '{}'", spec.name))
            })?;
            stage.validate(&spec.params)?;
            stages.push(ConfiguredStage {
                stage,
                params: spec.params.clone(),
            });
        }

        debug!(stages = stages.len(), "filter chain built");
        Ok(Self { stages })
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in application order.
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.stage.name()).collect()
    }

    /// Compose every stage on top of `input`, innermost first.
    ///
    /// Parameters are expanded against `ctx` now, so the returned stream is
    /// bound to the item the context currently describes.
    pub fn wrap(&self, input: Box<dyn Read>, ctx: &DynamicContext) -> Result<Box<dyn Read>> {
        self.stages.iter().try_fold(input, |stream, configured| {
            let params = StageParams::expand(&configured.params, ctx);
            trace!(stage = configured.stage.name(), "opening filter stage");
            configured.stage.wrap(stream, &params)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use appendix_shared::{CURRENT_FILE, FilterStageSpec};

    use super::*;

    fn chain(filters: Vec<FilterStageSpec>) -> Result<FilterChain> {
        FilterChain::build(&[FilterChainSpec { filters }], &FilterRegistry::new())
    }

    fn run(chain: &FilterChain, input: &str, ctx: &DynamicContext) -> String {
        let mut out = String::new();
        chain
            .wrap(Box::new(Cursor::new(input.as_bytes().to_vec())), ctx)
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn empty_chain_is_identity() {
        let out = run(&FilterChain::empty(), "a\tb\n", &DynamicContext::new());
        assert_eq!(out, "a\tb\n");
    }

    #[test]
    fn stages_apply_in_declaration_order() {
        let chain = chain(vec![
            FilterStageSpec::new("tab_to_spaces", [("tablength", "2")]),
            FilterStageSpec::new("prefix_lines", [("prefix", "\t")]),
        ])
        .unwrap();
        assert_eq!(chain.names(), vec!["tab_to_spaces", "prefix_lines"]);

        // The prefix tab is added after tabs were expanded, so it survives.
        let out = run(&chain, "a\tb\n", &DynamicContext::new());
        assert_eq!(out, "\ta  b\n");
    }

    #[test]
    fn chains_are_flattened_in_order() {
        let chains = vec![
            FilterChainSpec {
                filters: vec![FilterStageSpec::new("prefix_lines", [("prefix", "1:")])],
            },
            FilterChainSpec {
                filters: vec![FilterStageSpec::new("prefix_lines", [("prefix", "2:")])],
            },
        ];
        let chain = FilterChain::build(&chains, &FilterRegistry::new()).unwrap();
        assert_eq!(run(&chain, "x\n", &DynamicContext::new()), "2:1:x\n");
    }

    #[test]
    fn params_expand_per_wrap() {
        let chain = chain(vec![FilterStageSpec::new(
            "prefix_lines",
            [("prefix", "%{current_file}: ")],
        )])
        .unwrap();

        let mut ctx = DynamicContext::new();
        ctx.set(CURRENT_FILE, "a.txt");
        let first = run(&chain, "one\n", &ctx);
        ctx.set(CURRENT_FILE, "b.txt");
        let second = run(&chain, "two\n", &ctx);

        assert_eq!(first, "a.txt: one\n");
        assert_eq!(second, "b.txt: two\n");
    }

    #[test]
    fn unknown_filter_is_config_error() {
        let err = chain(vec![FilterStageSpec::new("xsltfilter", [("style", "x.xsl")])])
            .err()
            .unwrap();
        assert!(matches!(err, AppendixError::Config { .. }));
        assert!(err.to_string().contains("xsltfilter"));
    }

    #[test]
    fn missing_required_param_is_config_error() {
        let err = chain(vec![FilterStageSpec::new(
            "prefix_lines",
            Vec::<(String, String)>::new(),
        )])
        .err()
        .unwrap();
        assert!(err.to_string().contains("requires parameter 'prefix'"));
    }

    #[test]
    fn unknown_param_is_config_error() {
        let err = chain(vec![FilterStageSpec::new("tab_to_spaces", [("width", "4")])])
            .err()
            .unwrap();
        assert!(err.to_string().contains("no parameter 'width'"));
    }

    #[test]
    fn registry_lookup_and_override() {
        let mut registry = FilterRegistry::new();
        assert!(registry.get("prefix_lines").is_some());
        assert!(registry.get("nope").is_none());

        let before = registry.iter().count();
        registry.register(Arc::new(PrefixLines));
        assert_eq!(registry.iter().count(), before);

        assert_eq!(FilterRegistry::empty().iter().count(), 0);
    }
}
