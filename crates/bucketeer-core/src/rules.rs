//! Rule compilation and per-path evaluation.
//!
//! Each rule's pattern is compiled once per batch. Unlike a first-match
//! router, every rule is evaluated for every path: a path that matches three
//! rules is registered three times, once per rule.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::Rule;
use crate::error::{PatternError, PipelineError, TemplateResult};
use crate::matcher::PatternMatcher;
use crate::reconcile::simplified_address;
use crate::template;

/// Compiled rule set, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    compiled: Vec<CompiledRule>,
}

/// A rule with its pattern compiled.
///
/// A malformed pattern is kept rather than dropped so that every path it is
/// evaluated against can report the failure.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    index: usize,
    rule: Rule,
    matcher: Result<PatternMatcher, PatternError>,
}

/// A rule that matched a path, with its group name resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MatchOutcome {
    /// Position of the rule in the rule set.
    pub rule: usize,
    /// The rule's pattern.
    pub pattern: String,
    /// Group name produced by the rule's template. Blank means the default
    /// group.
    pub group: String,
    /// Address the entry would get if its address is still unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_hint: Option<String>,
}

impl CompiledRule {
    fn new(index: usize, rule: &Rule) -> Self {
        let matcher = PatternMatcher::compile(&rule.pattern, rule.match_kind);
        if let Err(ref e) = matcher {
            tracing::warn!(rule = index, pattern = %rule.pattern, error = %e, "rule pattern does not compile");
        }
        Self {
            index,
            rule: rule.clone(),
            matcher,
        }
    }

    /// Position of the rule in the rule set.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The rule as configured.
    pub const fn rule(&self) -> &Rule {
        &self.rule
    }

    /// Test `path` against the rule's pattern.
    pub fn is_match(&self, path: &str) -> Result<bool, PatternError> {
        match self.matcher {
            Ok(ref m) => Ok(m.is_match(path)),
            Err(ref e) => Err(e.clone()),
        }
    }

    /// Expand the rule's group template against `path`.
    ///
    /// A blank `path` falls back to the rule's own pattern.
    pub fn group_name(&self, path: &str) -> TemplateResult<String> {
        if !template::has_placeholders(&self.rule.group) {
            return Ok(self.rule.group.clone());
        }
        let index_path = if path.trim().is_empty() {
            self.rule.pattern.as_str()
        } else {
            path
        };
        template::resolve(&self.rule.group, index_path)
    }

    /// Match `path` and, on a match, resolve its group.
    ///
    /// Returns `Ok(None)` when the pattern does not match.
    pub fn evaluate(&self, path: &str) -> Result<Option<MatchOutcome>, PipelineError> {
        if !self.is_match(path)? {
            return Ok(None);
        }
        let group = self.group_name(path)?;
        Ok(Some(MatchOutcome {
            rule: self.index,
            pattern: self.rule.pattern.clone(),
            group,
            address_hint: self
                .rule
                .simplify_address
                .then(|| simplified_address(path)),
        }))
    }
}

impl RuleSet {
    /// Compile a list of rules into a `RuleSet`.
    ///
    /// Invalid regex patterns are kept and logged; they fail per path at
    /// evaluation time.
    pub fn compile(rules: &[Rule]) -> Self {
        let compiled = rules
            .iter()
            .enumerate()
            .map(|(index, rule)| CompiledRule::new(index, rule))
            .collect();
        Self { compiled }
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    /// Returns `true` if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }

    /// Iterate over rules in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &CompiledRule> {
        self.compiled.iter()
    }

    /// Evaluate every rule against `path` without touching a catalog.
    ///
    /// Non-matching rules are omitted; failures are returned in place.
    pub fn evaluate(&self, path: &str) -> Vec<Result<MatchOutcome, (usize, PipelineError)>> {
        self.compiled
            .iter()
            .filter_map(|rule| match rule.evaluate(path) {
                Ok(Some(outcome)) => Some(Ok(outcome)),
                Ok(None) => None,
                Err(e) => Some(Err((rule.index, e))),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchKind;

    fn rule(pattern: &str, kind: MatchKind, group: &str) -> Rule {
        Rule {
            pattern: pattern.to_string(),
            match_kind: kind,
            group: group.to_string(),
            ..Rule::default()
        }
    }

    #[test]
    fn no_rules_returns_empty() {
        let set = RuleSet::compile(&[]);
        assert!(set.is_empty());
        assert!(set.evaluate("anything.png").is_empty());
    }

    #[test]
    fn every_matching_rule_contributes_in_order() {
        let set = RuleSet::compile(&[
            rule("Assets/Art", MatchKind::Wildcard, "Art"),
            rule("Assets/Audio", MatchKind::Wildcard, "Audio"),
            rule(r"\.png$", MatchKind::Regex, "Textures-%PATH%[1]"),
        ]);

        let outcomes: Vec<_> = set
            .evaluate("Assets/Art/hero.png")
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].rule, 0);
        assert_eq!(outcomes[0].group, "Art");
        assert_eq!(outcomes[1].rule, 2);
        assert_eq!(outcomes[1].group, "Textures-Art");
    }

    #[test]
    fn bad_regex_fails_only_its_rule() {
        let set = RuleSet::compile(&[
            rule("Assets/(", MatchKind::Regex, "Broken"),
            rule("Assets", MatchKind::Wildcard, "Good"),
        ]);
        assert_eq!(set.len(), 2);

        let results = set.evaluate("Assets/a.png");
        assert_eq!(results.len(), 2);
        let (index, err) = results[0].as_ref().unwrap_err();
        assert_eq!(*index, 0);
        assert!(matches!(err, PipelineError::PatternCompile(_)));
        assert_eq!(results[1].as_ref().unwrap().group, "Good");
    }

    #[test]
    fn degenerate_template_fails_only_its_rule() {
        let set = RuleSet::compile(&[
            rule("READ", MatchKind::Wildcard, "Docs-%PATH%[1]"),
            rule("READ", MatchKind::Wildcard, "Docs"),
        ]);

        let results = set.evaluate("README.md");
        assert!(matches!(results[0], Err((0, PipelineError::Template(_)))));
        assert_eq!(results[1].as_ref().unwrap().group, "Docs");
    }

    #[test]
    fn address_hint_only_when_simplifying() {
        let mut simplify = rule("Assets", MatchKind::Wildcard, "");
        simplify.simplify_address = true;
        let set = RuleSet::compile(&[simplify, rule("Assets", MatchKind::Wildcard, "")]);

        let results = set.evaluate("Assets/Art/hero.png");
        assert_eq!(
            results[0].as_ref().unwrap().address_hint.as_deref(),
            Some("hero")
        );
        assert!(results[1].as_ref().unwrap().address_hint.is_none());
    }

    #[test]
    fn blank_path_resolves_against_pattern() {
        let set = RuleSet::compile(&[rule("Assets/Art/*", MatchKind::Wildcard, "G-%PATH%[1]")]);
        let compiled = set.iter().next().unwrap();
        assert_eq!(compiled.group_name("  ").unwrap(), "G-Art");
        assert_eq!(compiled.group_name("Assets/UI/x").unwrap(), "G-UI");
    }

    #[test]
    fn literal_group_is_returned_verbatim() {
        let set = RuleSet::compile(&[rule("READ", MatchKind::Wildcard, "  Docs [1] ")]);
        let compiled = set.iter().next().unwrap();
        assert_eq!(compiled.group_name("README.md").unwrap(), "  Docs [1] ");
    }
}
